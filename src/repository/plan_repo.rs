// ==========================================
// 外勤医师排班系统 - 排班方案仓储
// ==========================================
// 红线:
// - 同月同名方案幂等覆盖（保持 plan_id 与确定状态）
// - 同月至多一个确定方案（confirm 在单事务内保证）
// ==========================================

use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::domain::plan::{PlanAssignment, SchedulePlan};
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// PlanRepository - 排班方案仓储
// ==========================================
pub struct PlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanRepository {
    /// 创建新的 PlanRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn now_string() -> String {
        Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn parse_timestamp(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_else(|_| NaiveDateTime::default())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<SchedulePlan> {
        let assignments_raw: String = row.get(3)?;
        let created_raw: String = row.get(8)?;
        let updated_raw: String = row.get(9)?;

        // 明细列损坏时按空方案返回（管理员可重新生成）
        let assignments: Vec<PlanAssignment> = serde_json::from_str(&assignments_raw)
            .unwrap_or_else(|e| {
                warn!(error = %e, "方案明细列解析失败，按空处理");
                Vec::new()
            });

        Ok(SchedulePlan {
            plan_id: row.get(0)?,
            year_month: row.get(1)?,
            plan_name: row.get(2)?,
            assignments,
            total_variance: row.get(4)?,
            satisfaction_score: row.get(5)?,
            has_shortage: row.get::<_, i64>(6)? != 0,
            is_confirmed: row.get::<_, i64>(7)? != 0,
            created_at: Self::parse_timestamp(&created_raw),
            updated_at: Self::parse_timestamp(&updated_raw),
        })
    }

    const SELECT_COLUMNS: &'static str = r#"plan_id, year_month, plan_name, assignments,
        total_variance, satisfaction_score, has_shortage, is_confirmed,
        created_at, updated_at"#;

    fn assignments_to_json(assignments: &[PlanAssignment]) -> RepositoryResult<String> {
        serde_json::to_string(assignments)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    /// 保存方案（同月同名幂等覆盖）
    ///
    /// # 规则
    /// - 同月内已有同名方案时：覆盖明细与指标，保持 plan_id / 确定状态 / created_at
    /// - 否则新规插入（is_confirmed=false）
    ///
    /// # 返回
    /// 实际持久化后的方案（覆盖时 plan_id 为既存值）
    pub fn save(&self, plan: &SchedulePlan) -> RepositoryResult<SchedulePlan> {
        let conn = self.get_conn()?;
        let now = Self::now_string();
        let assignments_json = Self::assignments_to_json(&plan.assignments)?;

        let existing: Option<String> = match conn.query_row(
            "SELECT plan_id FROM schedule_plan WHERE year_month = ?1 AND plan_name = ?2",
            params![plan.year_month, plan.plan_name],
            |row| row.get(0),
        ) {
            Ok(id) => Some(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        let plan_id = match existing {
            Some(existing_id) => {
                conn.execute(
                    r#"UPDATE schedule_plan
                       SET assignments = ?1, total_variance = ?2, satisfaction_score = ?3,
                           has_shortage = ?4, updated_at = ?5
                       WHERE plan_id = ?6"#,
                    params![
                        assignments_json,
                        plan.total_variance,
                        plan.satisfaction_score,
                        plan.has_shortage as i64,
                        now,
                        existing_id,
                    ],
                )?;
                existing_id
            }
            None => {
                conn.execute(
                    r#"INSERT INTO schedule_plan (
                        plan_id, year_month, plan_name, assignments,
                        total_variance, satisfaction_score, has_shortage, is_confirmed,
                        created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)"#,
                    params![
                        plan.plan_id,
                        plan.year_month,
                        plan.plan_name,
                        assignments_json,
                        plan.total_variance,
                        plan.satisfaction_score,
                        plan.has_shortage as i64,
                        now,
                    ],
                )?;
                plan.plan_id.clone()
            }
        };

        drop(conn);
        self.find_by_id(&plan_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "SchedulePlan".to_string(),
            id: plan_id,
        })
    }

    /// 按ID查询方案
    pub fn find_by_id(&self, plan_id: &str) -> RepositoryResult<Option<SchedulePlan>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!(
                "SELECT {} FROM schedule_plan WHERE plan_id = ?1",
                Self::SELECT_COLUMNS
            ),
            params![plan_id],
            Self::map_row,
        ) {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询指定月的候选方案列表（新建在前）
    pub fn list_by_month(&self, year_month: &str) -> RepositoryResult<Vec<SchedulePlan>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM schedule_plan
               WHERE year_month = ?1
               ORDER BY created_at DESC, plan_name"#,
            Self::SELECT_COLUMNS
        ))?;
        let plans = stmt
            .query_map(params![year_month], Self::map_row)?
            .collect::<Result<Vec<SchedulePlan>, _>>()?;
        Ok(plans)
    }

    /// 确定方案
    ///
    /// # 规则
    /// 同月其他方案的确定标志在同一事务内清除（同月至多一个确定方案）
    pub fn confirm(&self, plan_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;

        let tx = conn.transaction()?;
        let year_month: String = match tx.query_row(
            "SELECT year_month FROM schedule_plan WHERE plan_id = ?1",
            params![plan_id],
            |row| row.get(0),
        ) {
            Ok(ym) => ym,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(RepositoryError::NotFound {
                    entity: "SchedulePlan".to_string(),
                    id: plan_id.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        tx.execute(
            "UPDATE schedule_plan SET is_confirmed = 0 WHERE year_month = ?1",
            params![year_month],
        )?;
        tx.execute(
            "UPDATE schedule_plan SET is_confirmed = 1, updated_at = ?1 WHERE plan_id = ?2",
            params![Self::now_string(), plan_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// 再编辑方案明细（指标由调用方经成本模型重算后传入）
    pub fn update_assignments(
        &self,
        plan_id: &str,
        assignments: &[PlanAssignment],
        total_variance: f64,
        satisfaction_score: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let has_shortage = assignments.iter().any(|a| a.is_short());

        let updated = conn.execute(
            r#"UPDATE schedule_plan
               SET assignments = ?1, total_variance = ?2, satisfaction_score = ?3,
                   has_shortage = ?4, updated_at = ?5
               WHERE plan_id = ?6"#,
            params![
                Self::assignments_to_json(assignments)?,
                total_variance,
                satisfaction_score,
                has_shortage as i64,
                Self::now_string(),
                plan_id,
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "SchedulePlan".to_string(),
                id: plan_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除方案
    pub fn delete(&self, plan_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM schedule_plan WHERE plan_id = ?1", params![plan_id])?;
        Ok(())
    }

    /// 存在确定方案的年月一览（新月在前）
    pub fn confirmed_months(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT DISTINCT year_month FROM schedule_plan
               WHERE is_confirmed = 1 ORDER BY year_month DESC"#,
        )?;
        let months = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(months)
    }

    /// 全月的确定方案一览（累计报酬计算用）
    pub fn list_confirmed(&self) -> RepositoryResult<Vec<SchedulePlan>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM schedule_plan
               WHERE is_confirmed = 1 ORDER BY year_month"#,
            Self::SELECT_COLUMNS
        ))?;
        let plans = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<SchedulePlan>, _>>()?;
        Ok(plans)
    }
}
