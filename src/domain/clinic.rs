// ==========================================
// 外勤医师排班系统 - 外勤先领域模型
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::{ClinicId, DoctorId, RecurrencePattern};

// ==========================================
// Clinic - 外勤先主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub clinic_id: ClinicId,             // 外勤先ID
    pub name: String,                    // 名称
    pub fee: i64,                        // 日给（非负整数货币单位）
    pub recurrence: RecurrencePattern,   // 出诊频度
    pub is_active: bool,                 // 启用标志
    pub nominated_doctors: Vec<DoctorId>, // 希望医师（软约束）
    pub fixed_doctors: Vec<DoctorId>,     // 固定医师（硬约束，可出勤时必须分配）
}

impl Clinic {
    /// 判断医师是否为该外勤先的固定医师
    pub fn is_fixed(&self, doctor_id: DoctorId) -> bool {
        self.fixed_doctors.contains(&doctor_id)
    }

    /// 判断医师是否为该外勤先的希望医师
    pub fn is_nominated(&self, doctor_id: DoctorId) -> bool {
        self.nominated_doctors.contains(&doctor_id)
    }
}
