// ==========================================
// 外勤医师排班系统 - 排班方案领域模型
// ==========================================
// 红线: 方案是快照；确定标志与再编辑之外不可变
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ClinicId, DoctorId};

// ==========================================
// PlanAssignment - 方案明细 ((外勤先, 日付) → 医师列)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAssignment {
    pub clinic_id: ClinicId,      // 外勤先ID
    pub date: NaiveDate,          // 出勤日
    pub required: u32,            // 必要人数
    pub doctor_ids: Vec<DoctorId>, // 分配的医师（不足时短于必要人数 = 人员缺口）
}

impl PlanAssignment {
    /// 该槽位是否未满员
    pub fn is_short(&self) -> bool {
        self.doctor_ids.len() < self.required as usize
    }
}

// ==========================================
// SchedulePlan - 月别排班方案
// ==========================================
// 同一月内 plan_name 唯一；再生成时同名幂等覆盖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePlan {
    pub plan_id: String,                  // 方案ID (UUID)
    pub year_month: String,               // 对象年月 ("YYYY-MM")
    pub plan_name: String,                // 方案名（管理员命名）
    pub assignments: Vec<PlanAssignment>, // 方案明细（按 日付→外勤先 排序）
    pub total_variance: f64,              // 公平性指标（月度报酬方差）
    pub satisfaction_score: f64,          // 满足度指标（未加权原始值）
    pub has_shortage: bool,               // 是否存在人员缺口
    pub is_confirmed: bool,               // 确定标志（同月至多一个）
    pub created_at: NaiveDateTime,        // 创建时刻
    pub updated_at: NaiveDateTime,        // 更新时刻
}

impl SchedulePlan {
    /// 统计方案内的总分配人次
    pub fn assignment_count(&self) -> usize {
        self.assignments.iter().map(|a| a.doctor_ids.len()).sum()
    }

    /// 人员缺口槽位一览
    pub fn short_slots(&self) -> Vec<&PlanAssignment> {
        self.assignments.iter().filter(|a| a.is_short()).collect()
    }
}
