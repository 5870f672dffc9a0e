// ==========================================
// 外勤医师排班系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod affinity_repo;
pub mod clinic_repo;
pub mod doctor_repo;
pub mod error;
mod json_columns;
pub mod override_repo;
pub mod plan_repo;
pub mod preference_repo;

// 重导出核心仓储
pub use affinity_repo::AffinityRepository;
pub use clinic_repo::ClinicRepository;
pub use doctor_repo::DoctorRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use override_repo::OverrideRepository;
pub use plan_repo::PlanRepository;
pub use preference_repo::PreferenceRepository;
