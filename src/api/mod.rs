// ==========================================
// 外勤医师排班系统 - API 层
// ==========================================
// 职责: 面向管理员操作的业务接口（方案生成/生命周期/集计）
// 红线: API 不直接拼 SQL，统一经由仓储层
// ==========================================

pub mod schedule_api;

// 重导出核心 API
pub use schedule_api::{DoctorIncome, ScheduleApi};
