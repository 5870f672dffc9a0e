// ==========================================
// 外勤医师排班系统 - 医师仓储
// ==========================================

use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

use crate::domain::doctor::Doctor;
use crate::domain::types::DoctorId;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// DoctorRepository - 医师仓储
// ==========================================
pub struct DoctorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DoctorRepository {
    /// 创建新的 DoctorRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
        Ok(Doctor {
            doctor_id: row.get(0)?,
            name: row.get(1)?,
            account: row.get(2)?,
            is_active: row.get::<_, i64>(3)? != 0,
            max_assignments: row.get::<_, i64>(4)?.max(0) as u32,
        })
    }

    /// 登记医师
    ///
    /// # 返回
    /// - `Ok(doctor_id)`: 新医师ID
    /// - `Err(UniqueConstraintViolation)`: 姓名重复
    pub fn create(&self, name: &str, account: &str) -> RepositoryResult<DoctorId> {
        if name.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "医师姓名不能为空".to_string(),
            ));
        }
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO doctor (name, account) VALUES (?1, ?2)",
            params![name, account],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询医师
    pub fn find_by_id(&self, doctor_id: DoctorId) -> RepositoryResult<Option<Doctor>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT doctor_id, name, account, is_active, max_assignments
               FROM doctor WHERE doctor_id = ?1"#,
            params![doctor_id],
            Self::map_row,
        ) {
            Ok(doctor) => Ok(Some(doctor)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询医师列表（姓名升序）
    ///
    /// # 参数
    /// - `active_only`: true 时仅返回在职医师
    pub fn list(&self, active_only: bool) -> RepositoryResult<Vec<Doctor>> {
        let conn = self.get_conn()?;

        let sql = if active_only {
            r#"SELECT doctor_id, name, account, is_active, max_assignments
               FROM doctor WHERE is_active = 1 ORDER BY name"#
        } else {
            r#"SELECT doctor_id, name, account, is_active, max_assignments
               FROM doctor ORDER BY name"#
        };

        let mut stmt = conn.prepare(sql)?;
        let doctors = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<Doctor>, _>>()?;
        Ok(doctors)
    }

    /// 更新医师（在职标志/月度上限）
    pub fn update(
        &self,
        doctor_id: DoctorId,
        is_active: Option<bool>,
        max_assignments: Option<u32>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        if let Some(active) = is_active {
            conn.execute(
                "UPDATE doctor SET is_active = ?1 WHERE doctor_id = ?2",
                params![active as i64, doctor_id],
            )?;
        }
        if let Some(cap) = max_assignments {
            conn.execute(
                "UPDATE doctor SET max_assignments = ?1 WHERE doctor_id = ?2",
                params![cap as i64, doctor_id],
            )?;
        }
        Ok(())
    }

    /// 删除医师（级联清理优先度行与月别希望）
    ///
    /// 管理操作；月中通常用停用（is_active=0）代替删除
    pub fn delete(&self, doctor_id: DoctorId) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute("DELETE FROM affinity WHERE doctor_id = ?1", params![doctor_id])?;
        conn.execute("DELETE FROM preference WHERE doctor_id = ?1", params![doctor_id])?;
        conn.execute("DELETE FROM doctor WHERE doctor_id = ?1", params![doctor_id])?;
        Ok(())
    }
}
