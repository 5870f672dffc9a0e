// ==========================================
// 外勤医师排班系统 - 外勤先仓储
// ==========================================

use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

use crate::domain::clinic::Clinic;
use crate::domain::types::{ClinicId, DoctorId, RecurrencePattern};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_columns::{id_list_to_json, parse_id_list};

// ==========================================
// ClinicRepository - 外勤先仓储
// ==========================================
pub struct ClinicRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ClinicRepository {
    /// 创建新的 ClinicRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Clinic> {
        let frequency: String = row.get(3)?;
        let nominated_raw: String = row.get(5)?;
        let fixed_raw: String = row.get(6)?;
        Ok(Clinic {
            clinic_id: row.get(0)?,
            name: row.get(1)?,
            fee: row.get(2)?,
            recurrence: RecurrencePattern::parse(&frequency),
            is_active: row.get::<_, i64>(4)? != 0,
            nominated_doctors: parse_id_list(&nominated_raw),
            fixed_doctors: parse_id_list(&fixed_raw),
        })
    }

    /// 登记外勤先
    pub fn create(
        &self,
        name: &str,
        fee: i64,
        recurrence: RecurrencePattern,
    ) -> RepositoryResult<ClinicId> {
        if name.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "外勤先名称不能为空".to_string(),
            ));
        }
        if fee < 0 {
            return Err(RepositoryError::ValidationError(
                "日给不能为负".to_string(),
            ));
        }
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO clinic (name, fee, frequency) VALUES (?1, ?2, ?3)",
            params![name, fee, recurrence.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询外勤先
    pub fn find_by_id(&self, clinic_id: ClinicId) -> RepositoryResult<Option<Clinic>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT clinic_id, name, fee, frequency, is_active,
                      nominated_doctors, fixed_doctors
               FROM clinic WHERE clinic_id = ?1"#,
            params![clinic_id],
            Self::map_row,
        ) {
            Ok(clinic) => Ok(Some(clinic)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询外勤先列表（名称升序）
    pub fn list(&self, active_only: bool) -> RepositoryResult<Vec<Clinic>> {
        let conn = self.get_conn()?;

        let sql = if active_only {
            r#"SELECT clinic_id, name, fee, frequency, is_active,
                      nominated_doctors, fixed_doctors
               FROM clinic WHERE is_active = 1 ORDER BY name"#
        } else {
            r#"SELECT clinic_id, name, fee, frequency, is_active,
                      nominated_doctors, fixed_doctors
               FROM clinic ORDER BY name"#
        };

        let mut stmt = conn.prepare(sql)?;
        let clinics = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<Clinic>, _>>()?;
        Ok(clinics)
    }

    /// 更新外勤先基本信息
    pub fn update(
        &self,
        clinic_id: ClinicId,
        fee: Option<i64>,
        recurrence: Option<RecurrencePattern>,
        is_active: Option<bool>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        if let Some(fee) = fee {
            conn.execute(
                "UPDATE clinic SET fee = ?1 WHERE clinic_id = ?2",
                params![fee, clinic_id],
            )?;
        }
        if let Some(recurrence) = recurrence {
            conn.execute(
                "UPDATE clinic SET frequency = ?1 WHERE clinic_id = ?2",
                params![recurrence.as_str(), clinic_id],
            )?;
        }
        if let Some(active) = is_active {
            conn.execute(
                "UPDATE clinic SET is_active = ?1 WHERE clinic_id = ?2",
                params![active as i64, clinic_id],
            )?;
        }
        Ok(())
    }

    /// 更新希望医师/固定医师集合
    pub fn set_doctor_sets(
        &self,
        clinic_id: ClinicId,
        nominated_doctors: &[DoctorId],
        fixed_doctors: &[DoctorId],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"UPDATE clinic SET nominated_doctors = ?1, fixed_doctors = ?2
               WHERE clinic_id = ?3"#,
            params![
                id_list_to_json(nominated_doctors),
                id_list_to_json(fixed_doctors),
                clinic_id
            ],
        )?;
        Ok(())
    }

    /// 删除外勤先（级联清理优先度行与日别设定）
    pub fn delete(&self, clinic_id: ClinicId) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute("DELETE FROM affinity WHERE clinic_id = ?1", params![clinic_id])?;
        conn.execute(
            "DELETE FROM clinic_date_override WHERE clinic_id = ?1",
            params![clinic_id],
        )?;
        conn.execute("DELETE FROM clinic WHERE clinic_id = ?1", params![clinic_id])?;
        Ok(())
    }
}
