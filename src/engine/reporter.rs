// ==========================================
// 外勤医师排班系统 - 方案打包引擎
// ==========================================
// 职责: 求解结果 → 可持久化・可比较的月别方案记录
// 红线: 缺口席位按"医师列表短于必要人数"原样暴露，供人工介入
// ==========================================

use chrono::Local;
use uuid::Uuid;

use crate::domain::plan::{PlanAssignment, SchedulePlan};
use crate::domain::slot::Slot;
use crate::engine::solver::SolveOutcome;

// ==========================================
// PlanReporter - 方案打包引擎
// ==========================================
pub struct PlanReporter {
    // 无状态引擎，不需要注入依赖
}

impl PlanReporter {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 打包求解结果
    ///
    /// # 参数
    /// - year_month: 对象年月 ("YYYY-MM")
    /// - plan_name: 方案名（同月同名 → 仓储层幂等覆盖）
    /// - slots: 求解输入槽位
    /// - outcome: 求解结果（seats 与 slots 一一对应）
    ///
    /// # 返回
    /// 新规 plan_id (UUID) 的方案记录；is_confirmed 初始为 false
    pub fn build_plan(
        &self,
        year_month: &str,
        plan_name: &str,
        slots: &[Slot],
        outcome: &SolveOutcome,
    ) -> SchedulePlan {
        let now = Local::now().naive_local();

        let assignments: Vec<PlanAssignment> = slots
            .iter()
            .zip(outcome.seats.iter())
            .map(|(slot, doctor_ids)| PlanAssignment {
                clinic_id: slot.clinic_id,
                date: slot.date,
                required: slot.required,
                doctor_ids: doctor_ids.clone(),
            })
            .collect();

        SchedulePlan {
            plan_id: Uuid::new_v4().to_string(),
            year_month: year_month.to_string(),
            plan_name: plan_name.to_string(),
            assignments,
            total_variance: outcome.total_variance,
            satisfaction_score: outcome.satisfaction_score,
            has_shortage: outcome.has_shortage(),
            is_confirmed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for PlanReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_short_slot_is_visible_in_plan() {
        let slots = vec![Slot {
            clinic_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            required: 2,
            fee: 50_000,
        }];
        let outcome = SolveOutcome {
            seats: vec![vec![10]],
            satisfaction_score: 1.0,
            total_variance: 0.0,
            total_cost: -1.0,
            shortage_seats: 1,
            refine_passes: 1,
        };
        let plan = PlanReporter::new().build_plan("2026-08", "案A", &slots, &outcome);
        assert!(plan.has_shortage);
        assert_eq!(plan.assignments.len(), 1);
        assert!(plan.assignments[0].is_short());
        assert!(!plan.is_confirmed);
    }
}
