use serde::{Deserialize, Serialize};

/// 成本模型权重（持久化对象）
///
/// 存储位置：config_kv（scope_id='global'，key='weight_profile'）
/// 缺省值即生产默认值；方案生成时整体快照进日志便于复现
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    /// 公平性权重（越大越强调报酬方差最小化；默认主导平局）
    #[serde(default = "default_fairness_weight")]
    pub fairness_weight: f64,

    /// 满足度权重（优先度/希望加分的整体系数）
    #[serde(default = "default_satisfaction_weight")]
    pub satisfaction_weight: f64,

    /// 希望外勤先加分
    #[serde(default = "default_preferred_clinic_bonus")]
    pub preferred_clinic_bonus: f64,

    /// 日别指定希望加分（强于希望外勤先加分）
    #[serde(default = "default_date_request_bonus")]
    pub date_request_bonus: f64,

    /// 回避希望日扣分（软约束：可分配但不鼓励）
    #[serde(default = "default_avoid_penalty")]
    pub avoid_penalty: f64,
}

fn default_fairness_weight() -> f64 {
    1.0
}

fn default_satisfaction_weight() -> f64 {
    1.0
}

fn default_preferred_clinic_bonus() -> f64 {
    0.5
}

fn default_date_request_bonus() -> f64 {
    1.0
}

fn default_avoid_penalty() -> f64 {
    1.5
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self {
            fairness_weight: default_fairness_weight(),
            satisfaction_weight: default_satisfaction_weight(),
            preferred_clinic_bonus: default_preferred_clinic_bonus(),
            date_request_bonus: default_date_request_bonus(),
            avoid_penalty: default_avoid_penalty(),
        }
    }
}
