// ==========================================
// 外勤医师排班系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统 (管理员保留最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 出勤日历 - 对象月土曜日展开
pub mod calendar;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排班规则与求解
pub mod engine;

// 配置层 - 权重与求解参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/Schema 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AffinityLevel, ClinicId, DoctorId, RecurrencePattern};

// 领域实体
pub use domain::{
    Affinity, Clinic, Doctor, MonthlyPreference, PlanAssignment, SchedulePlan, Slot,
};

// 引擎
pub use engine::{
    ConstraintEvaluator, CostModel, EvaluationReport, HardViolation, PlanReporter,
    ScheduleContext, Shortage, SlotBuilder, SolveOutcome, Solver,
};

// 配置
pub use config::{ConfigManager, WeightProfile};

// API
pub use api::ScheduleApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "外勤医师排班系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
