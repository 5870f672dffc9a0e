// ==========================================
// 外勤医师排班系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod affinity;
pub mod clinic;
pub mod doctor;
pub mod plan;
pub mod preference;
pub mod slot;
pub mod types;

// 重导出核心类型
pub use affinity::Affinity;
pub use clinic::Clinic;
pub use doctor::Doctor;
pub use plan::{PlanAssignment, SchedulePlan};
pub use preference::MonthlyPreference;
pub use slot::Slot;
pub use types::{AffinityLevel, ClinicId, DoctorId, RecurrencePattern};
