// ==========================================
// 外勤医师排班系统 - 月别希望仓储
// ==========================================
// 红线: JSON 列在本层解析为强类型，引擎层不接触弱类型数据
// ==========================================

use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

use crate::domain::preference::MonthlyPreference;
use crate::domain::types::DoctorId;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_columns::{
    date_clinic_map_to_json, date_set_to_json, id_list_to_json, parse_date_clinic_map,
    parse_date_set, parse_id_list,
};

// ==========================================
// PreferenceRepository - 月别希望仓储
// ==========================================
pub struct PreferenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PreferenceRepository {
    /// 创建新的 PreferenceRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<MonthlyPreference> {
        let doctor_id: DoctorId = row.get(0)?;
        let ng_raw: String = row.get(1)?;
        let avoid_raw: String = row.get(2)?;
        let preferred_raw: String = row.get(3)?;
        let requests_raw: String = row.get(4)?;
        let free_text: String = row.get(5)?;
        let updated_raw: String = row.get(6)?;

        // NG 与回避重叠时 NG 优先，由 MonthlyPreference::new 规范化
        let mut pref = MonthlyPreference::new(
            doctor_id,
            parse_date_set(&ng_raw),
            parse_date_set(&avoid_raw),
            parse_id_list(&preferred_raw).into_iter().collect(),
            parse_date_clinic_map(&requests_raw),
            free_text,
        );
        pref.updated_at =
            NaiveDateTime::parse_from_str(&updated_raw, "%Y-%m-%d %H:%M:%S").ok();
        Ok(pref)
    }

    /// 登记/更新医师的月别希望（幂等覆盖）
    pub fn upsert(&self, year_month: &str, pref: &MonthlyPreference) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string();

        let preferred: Vec<i64> = pref.preferred_clinics.iter().copied().collect();
        conn.execute(
            r#"INSERT INTO preference (
                doctor_id, year_month, ng_dates, avoid_dates,
                preferred_clinics, date_clinic_requests, free_text, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (doctor_id, year_month) DO UPDATE SET
                ng_dates = excluded.ng_dates,
                avoid_dates = excluded.avoid_dates,
                preferred_clinics = excluded.preferred_clinics,
                date_clinic_requests = excluded.date_clinic_requests,
                free_text = excluded.free_text,
                updated_at = excluded.updated_at"#,
            params![
                pref.doctor_id,
                year_month,
                date_set_to_json(&pref.ng_dates),
                date_set_to_json(&pref.avoid_dates),
                id_list_to_json(&preferred),
                date_clinic_map_to_json(&pref.date_clinic_requests),
                pref.free_text,
                now,
            ],
        )?;
        Ok(())
    }

    /// 查询单个医师的月别希望
    pub fn find(
        &self,
        doctor_id: DoctorId,
        year_month: &str,
    ) -> RepositoryResult<Option<MonthlyPreference>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT doctor_id, ng_dates, avoid_dates, preferred_clinics,
                      date_clinic_requests, free_text, updated_at
               FROM preference WHERE doctor_id = ?1 AND year_month = ?2"#,
            params![doctor_id, year_month],
            Self::map_row,
        ) {
            Ok(pref) => Ok(Some(pref)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询指定月的全部希望
    pub fn list_by_month(&self, year_month: &str) -> RepositoryResult<Vec<MonthlyPreference>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT doctor_id, ng_dates, avoid_dates, preferred_clinics,
                      date_clinic_requests, free_text, updated_at
               FROM preference WHERE year_month = ?1 ORDER BY doctor_id"#,
        )?;
        let prefs = stmt
            .query_map(params![year_month], Self::map_row)?
            .collect::<Result<Vec<MonthlyPreference>, _>>()?;
        Ok(prefs)
    }
}
