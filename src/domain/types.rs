// ==========================================
// 外勤医师排班系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 医师ID
pub type DoctorId = i64;

/// 外勤先ID
pub type ClinicId = i64;

// ==========================================
// 出诊频度 (Recurrence Pattern)
// ==========================================
// 序列化格式: snake_case (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Weekly,       // 毎週
    BiweeklyOdd,  // 隔週（奇数週）
    BiweeklyEven, // 隔週（偶数週）
    FirstOnly,    // 第1週のみ
    LastOnly,     // 最終週のみ
}

impl RecurrencePattern {
    /// 数据库存储值
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::BiweeklyOdd => "biweekly_odd",
            RecurrencePattern::BiweeklyEven => "biweekly_even",
            RecurrencePattern::FirstOnly => "first_only",
            RecurrencePattern::LastOnly => "last_only",
        }
    }

    /// 从数据库存储值解析（未知值按 weekly 处理，容错而非中断）
    pub fn parse(value: &str) -> Self {
        match value {
            "biweekly_odd" => RecurrencePattern::BiweeklyOdd,
            "biweekly_even" => RecurrencePattern::BiweeklyEven,
            "first_only" => RecurrencePattern::FirstOnly,
            "last_only" => RecurrencePattern::LastOnly,
            _ => RecurrencePattern::Weekly,
        }
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 优先度等级 (Affinity Level)
// ==========================================
// 红线: 等级制（行かない/時々/必ず），不是自由评分制
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AffinityLevel {
    Never,     // 行かない (0.0)
    Sometimes, // 時々行く (1.0)
    Always,    // 必ず行く (2.0)
}

impl AffinityLevel {
    /// 评分权重（成本模型使用）
    pub fn weight(&self) -> f64 {
        match self {
            AffinityLevel::Never => 0.0,
            AffinityLevel::Sometimes => 1.0,
            AffinityLevel::Always => 2.0,
        }
    }

    /// 从存储的权重值解析（就近取整到合法等级）
    pub fn from_weight(weight: f64) -> Self {
        if weight < 0.5 {
            AffinityLevel::Never
        } else if weight < 1.5 {
            AffinityLevel::Sometimes
        } else {
            AffinityLevel::Always
        }
    }
}

impl fmt::Display for AffinityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AffinityLevel::Never => write!(f, "NEVER"),
            AffinityLevel::Sometimes => write!(f, "SOMETIMES"),
            AffinityLevel::Always => write!(f, "ALWAYS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recurrence_roundtrip() {
        for p in [
            RecurrencePattern::Weekly,
            RecurrencePattern::BiweeklyOdd,
            RecurrencePattern::BiweeklyEven,
            RecurrencePattern::FirstOnly,
            RecurrencePattern::LastOnly,
        ] {
            assert_eq!(RecurrencePattern::parse(p.as_str()), p);
        }
        // 未知值容错
        assert_eq!(RecurrencePattern::parse("???"), RecurrencePattern::Weekly);
    }

    #[test]
    fn test_affinity_weight_mapping() {
        assert_eq!(AffinityLevel::from_weight(0.0), AffinityLevel::Never);
        assert_eq!(AffinityLevel::from_weight(1.0), AffinityLevel::Sometimes);
        assert_eq!(AffinityLevel::from_weight(2.0), AffinityLevel::Always);
        assert_eq!(AffinityLevel::Always.weight(), 2.0);
    }
}
