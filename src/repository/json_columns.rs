// ==========================================
// 外勤医师排班系统 - JSON 列解析工具
// ==========================================
// 职责: 存储层的 JSON 列 → 强类型集合转换
// 红线: 解析失败按空值处理（容错而非中断管理员操作）
// ==========================================

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// 解析 ID 列表列（例: "[1,2,3]"）
pub(crate) fn parse_id_list(raw: &str) -> Vec<i64> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(ids) => ids,
        Err(e) => {
            warn!(raw, error = %e, "ID 列表列解析失败，按空处理");
            Vec::new()
        }
    }
}

/// 解析日付集合列（例: "[\"2026-08-01\",\"2026-08-08\"]"）
///
/// 无法解析为日付的元素逐个丢弃
pub(crate) fn parse_date_set(raw: &str) -> BTreeSet<NaiveDate> {
    if raw.trim().is_empty() {
        return BTreeSet::new();
    }
    let strings: Vec<String> = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(raw, error = %e, "日付集合列解析失败，按空处理");
            return BTreeSet::new();
        }
    };
    strings
        .iter()
        .filter_map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .collect()
}

/// 解析 日付→外勤先ID 映射列（例: "{\"2026-08-01\": 3}"）
///
/// 原系统存在以字符串存放 ID 的历史数据，数值/字符串两种形式都接受
pub(crate) fn parse_date_clinic_map(raw: &str) -> BTreeMap<NaiveDate, i64> {
    if raw.trim().is_empty() {
        return BTreeMap::new();
    }
    let entries: BTreeMap<String, serde_json::Value> = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(raw, error = %e, "日别指定希望列解析失败，按空处理");
            return BTreeMap::new();
        }
    };
    entries
        .into_iter()
        .filter_map(|(k, v)| {
            let date = NaiveDate::parse_from_str(&k, "%Y-%m-%d").ok()?;
            let clinic_id = match v {
                serde_json::Value::Number(n) => n.as_i64()?,
                serde_json::Value::String(s) => s.parse().ok()?,
                _ => return None,
            };
            Some((date, clinic_id))
        })
        .collect()
}

/// 序列化日付集合列
pub(crate) fn date_set_to_json(dates: &BTreeSet<NaiveDate>) -> String {
    let strings: Vec<String> = dates.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    serde_json::to_string(&strings).unwrap_or_else(|_| "[]".to_string())
}

/// 序列化 日付→外勤先ID 映射列
pub(crate) fn date_clinic_map_to_json(map: &BTreeMap<NaiveDate, i64>) -> String {
    let entries: BTreeMap<String, i64> = map
        .iter()
        .map(|(d, c)| (d.format("%Y-%m-%d").to_string(), *c))
        .collect();
    serde_json::to_string(&entries).unwrap_or_else(|_| "{}".to_string())
}

/// 序列化 ID 列表列
pub(crate) fn id_list_to_json(ids: &[i64]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list_tolerates_garbage() {
        assert_eq!(parse_id_list("[1, 2, 3]"), vec![1, 2, 3]);
        assert!(parse_id_list("not json").is_empty());
        assert!(parse_id_list("").is_empty());
    }

    #[test]
    fn test_parse_date_set_drops_bad_entries() {
        let set = parse_date_set(r#"["2026-08-01", "oops", "2026-08-08"]"#);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_parse_date_clinic_map_accepts_string_ids() {
        let map = parse_date_clinic_map(r#"{"2026-08-01": 3, "2026-08-08": "5", "bad": 1}"#);
        assert_eq!(map.len(), 2);
        let d = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();
        assert_eq!(map.get(&d), Some(&5));
    }
}
