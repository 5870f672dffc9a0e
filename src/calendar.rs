// ==========================================
// 外勤医师排班系统 - 出勤日历
// ==========================================
// 职责: 对象月土曜日展开、外勤先频度 → 开诊日集合
// 红线: 纯函数、无状态、无 I/O 操作
// ==========================================

use crate::domain::types::RecurrencePattern;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// 返回指定年月的全部土曜日（升序）
///
/// # 规则
/// - 无效年月 → 空列表（不 panic）
pub fn target_saturdays(year: i32, month: u32) -> Vec<NaiveDate> {
    let first = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => d,
        None => return Vec::new(),
    };

    // 从月初前进到当月第一个土曜日
    let offset = (Weekday::Sat.num_days_from_monday() + 7
        - first.weekday().num_days_from_monday())
        % 7;
    let mut current = first + Duration::days(offset as i64);

    let mut saturdays = Vec::new();
    while current.month() == month {
        saturdays.push(current);
        current = current + Duration::days(7);
    }
    saturdays
}

/// 按外勤先频度过滤开诊日
///
/// # 规则
/// - weekly: 全部土曜日
/// - biweekly_odd: 月内第 1/3/5 个土曜日（1 起算）
/// - biweekly_even: 月内第 2/4 个土曜日
/// - first_only: 月初第 1 个土曜日
/// - last_only: 月末最后 1 个土曜日
pub fn clinic_open_dates(
    recurrence: RecurrencePattern,
    saturdays: &[NaiveDate],
) -> Vec<NaiveDate> {
    match recurrence {
        RecurrencePattern::Weekly => saturdays.to_vec(),
        RecurrencePattern::BiweeklyOdd => saturdays
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 0)
            .map(|(_, d)| *d)
            .collect(),
        RecurrencePattern::BiweeklyEven => saturdays
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 1)
            .map(|(_, d)| *d)
            .collect(),
        RecurrencePattern::FirstOnly => saturdays.first().copied().into_iter().collect(),
        RecurrencePattern::LastOnly => saturdays.last().copied().into_iter().collect(),
    }
}

/// 规范化的年月键（"YYYY-MM"）
///
/// 仓储层的月别数据（希望/日别设定/方案）统一使用该键
pub fn year_month(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

// ==========================================
// 单元测试
// ==========================================
