// ==========================================
// 外勤医师排班系统 - 硬约束判定引擎
// ==========================================
// 职责: 候选分配（部分/完整）的硬规则判定与违规报告
// 红线: 无状态、无副作用、无 I/O 操作（求解器每步廉价调用）
// ==========================================

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use crate::domain::slot::Slot;
use crate::domain::types::{ClinicId, DoctorId};
use crate::engine::context::ScheduleContext;

// ==========================================
// HardViolation - 硬规则违反
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardViolation {
    /// 同一医师同日出现在多个槽位
    DoubleBooking { doctor_id: DoctorId, date: NaiveDate },
    /// NG日被分配
    NgAssignment { doctor_id: DoctorId, date: NaiveDate },
    /// 月度上限超过
    CapExceeded { doctor_id: DoctorId, cap: u32, count: usize },
    /// 分配人数超过必要人数
    OverStaffed { clinic_id: ClinicId, date: NaiveDate, required: u32, assigned: usize },
    /// 同一槽位内医师重复
    DuplicateSeat { doctor_id: DoctorId, clinic_id: ClinicId, date: NaiveDate },
    /// 分配中出现未知医师ID
    UnknownDoctor { doctor_id: DoctorId, clinic_id: ClinicId, date: NaiveDate },
    /// 固定医师可出勤却未被分配
    FixedDoctorMissing { doctor_id: DoctorId, clinic_id: ClinicId, date: NaiveDate },
}

impl fmt::Display for HardViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardViolation::DoubleBooking { doctor_id, date } => {
                write!(f, "同日重复出勤: doctor_id={} date={}", doctor_id, date)
            }
            HardViolation::NgAssignment { doctor_id, date } => {
                write!(f, "NG日被分配: doctor_id={} date={}", doctor_id, date)
            }
            HardViolation::CapExceeded { doctor_id, cap, count } => {
                write!(f, "月度上限超过: doctor_id={} cap={} count={}", doctor_id, cap, count)
            }
            HardViolation::OverStaffed { clinic_id, date, required, assigned } => {
                write!(
                    f,
                    "分配人数超员: clinic_id={} date={} required={} assigned={}",
                    clinic_id, date, required, assigned
                )
            }
            HardViolation::DuplicateSeat { doctor_id, clinic_id, date } => {
                write!(
                    f,
                    "槽位内医师重复: doctor_id={} clinic_id={} date={}",
                    doctor_id, clinic_id, date
                )
            }
            HardViolation::UnknownDoctor { doctor_id, clinic_id, date } => {
                write!(
                    f,
                    "未知医师ID: doctor_id={} clinic_id={} date={}",
                    doctor_id, clinic_id, date
                )
            }
            HardViolation::FixedDoctorMissing { doctor_id, clinic_id, date } => {
                write!(
                    f,
                    "固定医师未分配: doctor_id={} clinic_id={} date={}",
                    doctor_id, clinic_id, date
                )
            }
        }
    }
}

// ==========================================
// Shortage - 人员缺口（非违规，仅报告）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortage {
    pub clinic_id: ClinicId,
    pub date: NaiveDate,
    pub required: u32,
    pub assigned: usize,
}

// ==========================================
// EvaluationReport - 判定结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct EvaluationReport {
    pub violations: Vec<HardViolation>,
    pub shortages: Vec<Shortage>,
}

impl EvaluationReport {
    /// 硬规则全部满足（人员缺口不视为违规，按降级运行方针返回）
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_shortage(&self) -> bool {
        !self.shortages.is_empty()
    }
}

// ==========================================
// ConstraintEvaluator - 硬约束判定引擎
// ==========================================
pub struct ConstraintEvaluator {
    // 无状态引擎，不需要注入依赖
}

impl ConstraintEvaluator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 判定候选分配（seats[i] 与 slots[i] 一一对应）
    ///
    /// 硬规则:
    /// 1) 同一医师同日至多一个槽位
    /// 2) NG日不分配
    /// 3) 月度上限（0 = 不设限）
    /// 4) 分配人数不超过必要人数（不足计为人员缺口）
    /// 5) 固定医师在可出勤时必须占据一席
    /// 6) 槽位内医师不重复、ID必须已知
    pub fn evaluate(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: &[Vec<DoctorId>],
    ) -> EvaluationReport {
        let mut report = EvaluationReport::default();

        // 医师别合计与日别占用统计
        let mut total_counts: HashMap<DoctorId, usize> = HashMap::new();
        let mut date_counts: HashMap<(DoctorId, NaiveDate), usize> = HashMap::new();

        for (slot, assigned) in slots.iter().zip(seats.iter()) {
            let assigned_count = assigned.len();

            if assigned_count > slot.required as usize {
                report.violations.push(HardViolation::OverStaffed {
                    clinic_id: slot.clinic_id,
                    date: slot.date,
                    required: slot.required,
                    assigned: assigned_count,
                });
            } else if assigned_count < slot.required as usize {
                report.shortages.push(Shortage {
                    clinic_id: slot.clinic_id,
                    date: slot.date,
                    required: slot.required,
                    assigned: assigned_count,
                });
            }

            let mut seen_in_slot: Vec<DoctorId> = Vec::new();
            for &doctor_id in assigned {
                if ctx.doctor(doctor_id).is_none() {
                    report.violations.push(HardViolation::UnknownDoctor {
                        doctor_id,
                        clinic_id: slot.clinic_id,
                        date: slot.date,
                    });
                    continue;
                }
                if seen_in_slot.contains(&doctor_id) {
                    report.violations.push(HardViolation::DuplicateSeat {
                        doctor_id,
                        clinic_id: slot.clinic_id,
                        date: slot.date,
                    });
                }
                seen_in_slot.push(doctor_id);

                if ctx.is_ng(doctor_id, slot.date) {
                    report.violations.push(HardViolation::NgAssignment {
                        doctor_id,
                        date: slot.date,
                    });
                }

                *total_counts.entry(doctor_id).or_insert(0) += 1;
                *date_counts.entry((doctor_id, slot.date)).or_insert(0) += 1;
            }
        }

        // 同日重复出勤
        for (&(doctor_id, date), &count) in &date_counts {
            if count > 1 {
                report.violations.push(HardViolation::DoubleBooking { doctor_id, date });
            }
        }

        // 月度上限
        for (&doctor_id, &count) in &total_counts {
            if let Some(doctor) = ctx.doctor(doctor_id) {
                if doctor.has_cap() && count > doctor.max_assignments as usize {
                    report.violations.push(HardViolation::CapExceeded {
                        doctor_id,
                        cap: doctor.max_assignments,
                        count,
                    });
                }
            }
        }

        // 固定医师义务判定
        // 义务成立条件: 非NG日、当日未被分配到其他槽位、上限未达
        // （不成立时义务本身消灭，该席落回普通贪欲充填）
        for (slot, assigned) in slots.iter().zip(seats.iter()) {
            let clinic = match ctx.clinic(slot.clinic_id) {
                Some(c) => c,
                None => continue,
            };
            for &fixed_id in &clinic.fixed_doctors {
                if assigned.contains(&fixed_id) {
                    continue;
                }
                if ctx.is_ng(fixed_id, slot.date) {
                    continue;
                }
                if date_counts.get(&(fixed_id, slot.date)).copied().unwrap_or(0) > 0 {
                    continue;
                }
                let doctor = match ctx.doctor(fixed_id) {
                    Some(d) => d,
                    None => continue,
                };
                let count = total_counts.get(&fixed_id).copied().unwrap_or(0);
                if !doctor.cap_allows(count) {
                    continue;
                }
                report.violations.push(HardViolation::FixedDoctorMissing {
                    doctor_id: fixed_id,
                    clinic_id: slot.clinic_id,
                    date: slot.date,
                });
            }
        }

        // 缺口顺序确定化（测试与日志比较用）
        report
            .shortages
            .sort_by_key(|s| (s.date, s.clinic_id));
        report
    }

    /// 单席追加可否（求解器每候选一次的轻量判定）
    ///
    /// 判定内容: 已知医师、槽位未满、槽位内不重复、非NG日、
    /// 当日未被分配到其他槽位、月度上限未达
    pub fn seat_feasible(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: &[Vec<DoctorId>],
        slot_index: usize,
        doctor_id: DoctorId,
    ) -> bool {
        let slot = &slots[slot_index];
        let doctor = match ctx.doctor(doctor_id) {
            Some(d) => d,
            None => return false,
        };

        if seats[slot_index].len() >= slot.required as usize {
            return false;
        }
        if seats[slot_index].contains(&doctor_id) {
            return false;
        }
        if ctx.is_ng(doctor_id, slot.date) {
            return false;
        }

        let mut total = 0usize;
        for (other, assigned) in slots.iter().zip(seats.iter()) {
            for &id in assigned {
                if id != doctor_id {
                    continue;
                }
                if other.date == slot.date {
                    // 同日已被分配到其他槽位
                    return false;
                }
                total += 1;
            }
        }
        doctor.cap_allows(total)
    }

    /// 单席追加可否（含「行かない」优先度的排除）
    ///
    /// 贪欲充填与局部搜索使用；固定医师播种不经过本判定
    /// （明示的固定指定强于常设优先度）
    pub fn seat_placeable(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: &[Vec<DoctorId>],
        slot_index: usize,
        doctor_id: DoctorId,
    ) -> bool {
        if ctx.affinity(doctor_id, slots[slot_index].clinic_id) <= 0.0 {
            return false;
        }
        self.seat_feasible(ctx, slots, seats, slot_index, doctor_id)
    }
}

impl Default for ConstraintEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clinic::Clinic;
    use crate::domain::doctor::Doctor;
    use crate::domain::preference::MonthlyPreference;
    use crate::domain::types::RecurrencePattern;
    use std::collections::{BTreeMap, BTreeSet};

    fn doctor(id: DoctorId, cap: u32) -> Doctor {
        Doctor {
            doctor_id: id,
            name: format!("医師{}", id),
            account: String::new(),
            is_active: true,
            max_assignments: cap,
        }
    }

    fn clinic(id: ClinicId, fixed: Vec<DoctorId>) -> Clinic {
        Clinic {
            clinic_id: id,
            name: format!("クリニック{}", id),
            fee: 50_000,
            recurrence: RecurrencePattern::Weekly,
            is_active: true,
            nominated_doctors: Vec::new(),
            fixed_doctors: fixed,
        }
    }

    fn slot(clinic_id: ClinicId, day: u32, required: u32) -> Slot {
        Slot {
            clinic_id,
            date: NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
            required,
            fee: 50_000,
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, day).unwrap()
    }

    fn ng_pref(doctor_id: DoctorId, day: u32) -> MonthlyPreference {
        MonthlyPreference::new(
            doctor_id,
            [d(day)].into_iter().collect(),
            BTreeSet::new(),
            BTreeSet::new(),
            BTreeMap::new(),
            String::new(),
        )
    }

    fn ctx(doctors: Vec<Doctor>, clinics: Vec<Clinic>, prefs: Vec<MonthlyPreference>) -> ScheduleContext {
        ScheduleContext::new(doctors, clinics, HashMap::new(), prefs)
    }

    #[test]
    fn test_double_booking_is_flagged() {
        let ctx = ctx(vec![doctor(1, 0)], vec![clinic(10, vec![]), clinic(11, vec![])], vec![]);
        let slots = vec![slot(10, 1, 1), slot(11, 1, 1)];
        let report = ConstraintEvaluator::new().evaluate(&ctx, &slots, &[vec![1], vec![1]]);
        assert!(report
            .violations
            .contains(&HardViolation::DoubleBooking { doctor_id: 1, date: d(1) }));
    }

    #[test]
    fn test_ng_assignment_is_flagged() {
        let ctx = ctx(vec![doctor(1, 0)], vec![clinic(10, vec![])], vec![ng_pref(1, 1)]);
        let slots = vec![slot(10, 1, 1)];
        let report = ConstraintEvaluator::new().evaluate(&ctx, &slots, &[vec![1]]);
        assert!(report
            .violations
            .contains(&HardViolation::NgAssignment { doctor_id: 1, date: d(1) }));
    }

    #[test]
    fn test_cap_exceeded_is_flagged() {
        let ctx = ctx(vec![doctor(1, 1)], vec![clinic(10, vec![])], vec![]);
        let slots = vec![slot(10, 1, 1), slot(10, 8, 1)];
        let report = ConstraintEvaluator::new().evaluate(&ctx, &slots, &[vec![1], vec![1]]);
        assert!(report
            .violations
            .contains(&HardViolation::CapExceeded { doctor_id: 1, cap: 1, count: 2 }));
    }

    #[test]
    fn test_over_staffing_and_duplicate_seat() {
        let ctx = ctx(vec![doctor(1, 0)], vec![clinic(10, vec![])], vec![]);
        let slots = vec![slot(10, 1, 1)];
        let report = ConstraintEvaluator::new().evaluate(&ctx, &slots, &[vec![1, 1]]);
        assert!(report.violations.iter().any(|v| matches!(v, HardViolation::OverStaffed { .. })));
        assert!(report.violations.iter().any(|v| matches!(v, HardViolation::DuplicateSeat { .. })));
    }

    #[test]
    fn test_unknown_doctor_is_flagged() {
        let ctx = ctx(vec![doctor(1, 0)], vec![clinic(10, vec![])], vec![]);
        let slots = vec![slot(10, 1, 1)];
        let report = ConstraintEvaluator::new().evaluate(&ctx, &slots, &[vec![99]]);
        assert!(report
            .violations
            .contains(&HardViolation::UnknownDoctor { doctor_id: 99, clinic_id: 10, date: d(1) }));
    }

    #[test]
    fn test_under_staffing_is_shortage_not_violation() {
        let ctx = ctx(vec![doctor(1, 0)], vec![clinic(10, vec![])], vec![]);
        let slots = vec![slot(10, 1, 2)];
        let report = ConstraintEvaluator::new().evaluate(&ctx, &slots, &[vec![1]]);
        assert!(report.is_feasible());
        assert!(report.has_shortage());
        assert_eq!(report.shortages[0].assigned, 1);
    }

    #[test]
    fn test_fixed_doctor_missing_is_flagged() {
        let ctx = ctx(
            vec![doctor(1, 0), doctor(2, 0)],
            vec![clinic(10, vec![1])],
            vec![],
        );
        let slots = vec![slot(10, 1, 1)];
        let report = ConstraintEvaluator::new().evaluate(&ctx, &slots, &[vec![2]]);
        assert!(report
            .violations
            .contains(&HardViolation::FixedDoctorMissing { doctor_id: 1, clinic_id: 10, date: d(1) }));
    }

    #[test]
    fn test_fixed_doctor_mandate_lapses_when_ng_or_busy() {
        // NG 的场合
        let ctx_ng = ctx(
            vec![doctor(1, 0), doctor(2, 0)],
            vec![clinic(10, vec![1])],
            vec![ng_pref(1, 1)],
        );
        let slots = vec![slot(10, 1, 1)];
        let report = ConstraintEvaluator::new().evaluate(&ctx_ng, &slots, &[vec![2]]);
        assert!(report.is_feasible());

        // 同日已被分配到其他槽位的场合
        let ctx_busy = ctx(
            vec![doctor(1, 0), doctor(2, 0)],
            vec![clinic(10, vec![1]), clinic(11, vec![])],
            vec![],
        );
        let slots = vec![slot(10, 1, 1), slot(11, 1, 1)];
        let report = ConstraintEvaluator::new().evaluate(&ctx_busy, &slots, &[vec![2], vec![1]]);
        assert!(report.is_feasible());
    }

    #[test]
    fn test_seat_feasible_respects_fill_and_cap() {
        let ctx = ctx(vec![doctor(1, 1), doctor(2, 0)], vec![clinic(10, vec![])], vec![]);
        let slots = vec![slot(10, 1, 1), slot(10, 8, 1)];
        let evaluator = ConstraintEvaluator::new();

        // 满席的槽位不可追加
        assert!(!evaluator.seat_feasible(&ctx, &slots, &[vec![2], vec![]], 0, 1));
        // 上限 1 的医师不能进第 2 个槽位
        assert!(!evaluator.seat_feasible(&ctx, &slots, &[vec![1], vec![]], 1, 1));
        assert!(evaluator.seat_feasible(&ctx, &slots, &[vec![1], vec![]], 1, 2));
    }

    #[test]
    fn test_seat_placeable_excludes_never_affinity() {
        let ctx = ScheduleContext::new(
            vec![doctor(1, 0)],
            vec![clinic(10, vec![])],
            HashMap::from([((1, 10), 0.0)]),
            Vec::new(),
        );
        let slots = vec![slot(10, 1, 1)];
        let evaluator = ConstraintEvaluator::new();
        assert!(!evaluator.seat_placeable(&ctx, &slots, &[vec![]], 0, 1));
        assert!(evaluator.seat_feasible(&ctx, &slots, &[vec![]], 0, 1));
    }
}
