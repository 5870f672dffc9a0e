// ==========================================
// 外勤医师排班系统 - 优先度仓储
// ==========================================
// 约束: 每 (医师, 外勤先) 至多一行（主键保证）
// ==========================================

use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::affinity::Affinity;
use crate::domain::types::{AffinityLevel, ClinicId, DoctorId};
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// AffinityRepository - 优先度仓储
// ==========================================
pub struct AffinityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AffinityRepository {
    /// 创建新的 AffinityRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 设定优先度（幂等覆盖）
    pub fn set(
        &self,
        doctor_id: DoctorId,
        clinic_id: ClinicId,
        level: AffinityLevel,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO affinity (doctor_id, clinic_id, weight) VALUES (?1, ?2, ?3)
               ON CONFLICT (doctor_id, clinic_id) DO UPDATE SET weight = excluded.weight"#,
            params![doctor_id, clinic_id, level.weight()],
        )?;
        Ok(())
    }

    /// 查询全部优先度行
    pub fn list(&self) -> RepositoryResult<Vec<Affinity>> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT doctor_id, clinic_id, weight FROM affinity ORDER BY doctor_id, clinic_id")?;
        let rows = stmt
            .query_map([], |row| {
                let weight: f64 = row.get(2)?;
                Ok(Affinity {
                    doctor_id: row.get(0)?,
                    clinic_id: row.get(1)?,
                    level: AffinityLevel::from_weight(weight),
                })
            })?
            .collect::<Result<Vec<Affinity>, _>>()?;
        Ok(rows)
    }

    /// 查询优先度权重映射（引擎输入形式）
    pub fn weight_map(&self) -> RepositoryResult<HashMap<(DoctorId, ClinicId), f64>> {
        Ok(self
            .list()?
            .into_iter()
            .map(|a| ((a.doctor_id, a.clinic_id), a.level.weight()))
            .collect())
    }
}
