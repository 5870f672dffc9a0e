// ==========================================
// 外勤医师排班系统 - 优先度领域模型
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::{AffinityLevel, ClinicId, DoctorId};

// ==========================================
// Affinity - 医师×外勤先 优先度行
// ==========================================
// 不存在的行默认 Sometimes (1.0)；每 (医师, 外勤先) 至多一行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affinity {
    pub doctor_id: DoctorId, // 医师ID
    pub clinic_id: ClinicId, // 外勤先ID
    pub level: AffinityLevel, // 优先度等级
}
