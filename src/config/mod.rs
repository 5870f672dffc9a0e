// ==========================================
// 外勤医师排班系统 - 配置层
// ==========================================
// 职责: 系统配置管理（成本权重/求解参数）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod weight_profile;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_REFINE_PASS_BUDGET};
pub use weight_profile::WeightProfile;
