// ==========================================
// 外勤医师排班系统 - 日别人数设定仓储
// ==========================================
// 约束: 仅保存非默认值（required=1 时删除行而非保存）
// ==========================================

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::types::ClinicId;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// OverrideRepository - 日别人数设定仓储
// ==========================================
pub struct OverrideRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OverrideRepository {
    /// 创建新的 OverrideRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 设定单日必要人数
    ///
    /// # 规则
    /// - required_doctors ∈ {0, 1, 2}
    /// - 1（默认值）时删除既存行
    pub fn set(
        &self,
        clinic_id: ClinicId,
        date: NaiveDate,
        required_doctors: u32,
    ) -> RepositoryResult<()> {
        if required_doctors > 2 {
            return Err(RepositoryError::ValidationError(format!(
                "必要人数超出范围 (0-2): {}",
                required_doctors
            )));
        }
        let conn = self.get_conn()?;
        let date_str = date.format("%Y-%m-%d").to_string();

        if required_doctors == 1 {
            conn.execute(
                "DELETE FROM clinic_date_override WHERE clinic_id = ?1 AND date = ?2",
                params![clinic_id, date_str],
            )?;
        } else {
            conn.execute(
                r#"INSERT INTO clinic_date_override (clinic_id, date, required_doctors)
                   VALUES (?1, ?2, ?3)
                   ON CONFLICT (clinic_id, date)
                   DO UPDATE SET required_doctors = excluded.required_doctors"#,
                params![clinic_id, date_str, required_doctors as i64],
            )?;
        }
        Ok(())
    }

    /// 一括设定（管理画面的批量保存）
    pub fn set_batch(
        &self,
        changes: &HashMap<(ClinicId, NaiveDate), u32>,
    ) -> RepositoryResult<()> {
        for ((clinic_id, date), required) in changes {
            self.set(*clinic_id, *date, *required)?;
        }
        Ok(())
    }

    /// 查询指定月的全部设定
    ///
    /// # 返回
    /// {(clinic_id, date): required_doctors}；无行 = 默认 1
    pub fn month_map(
        &self,
        year_month: &str,
    ) -> RepositoryResult<HashMap<(ClinicId, NaiveDate), u32>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT clinic_id, date, required_doctors
               FROM clinic_date_override
               WHERE date LIKE ?1 || '%'"#,
        )?;
        let mut result = HashMap::new();
        let rows = stmt.query_map(params![year_month], |row| {
            let clinic_id: i64 = row.get(0)?;
            let date_str: String = row.get(1)?;
            let required: i64 = row.get(2)?;
            Ok((clinic_id, date_str, required))
        })?;
        for row in rows {
            let (clinic_id, date_str, required) = row?;
            // 历史数据中的异常日付行忽略
            if let Ok(date) = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d") {
                result.insert((clinic_id, date), required.clamp(0, 2) as u32);
            }
        }
        Ok(result)
    }
}
