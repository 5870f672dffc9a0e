// ==========================================
// 外勤医师排班系统 - 需求槽位领域模型
// ==========================================
// 红线: Slot 由 SlotBuilder 派生，不独立持久化
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::ClinicId;

// ==========================================
// Slot - 一个 (外勤先, 日付) 的人数需求单元
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub clinic_id: ClinicId, // 外勤先ID
    pub date: NaiveDate,     // 出勤日
    pub required: u32,       // 必要人数 (1 或 2; 0 不产生槽位)
    pub fee: i64,            // 日给快照（公平性计算使用）
}
