// ==========================================
// 排班求解引擎集成测试
// ==========================================
// 测试目标: 验证硬约束健全性、固定医师义务、降级运行、
//           公平性单调性、再现性
// ==========================================

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use clinic_duty_aps::calendar;
use clinic_duty_aps::config::{WeightProfile, DEFAULT_REFINE_PASS_BUDGET};
use clinic_duty_aps::domain::clinic::Clinic;
use clinic_duty_aps::domain::doctor::Doctor;
use clinic_duty_aps::domain::preference::MonthlyPreference;
use clinic_duty_aps::domain::slot::Slot;
use clinic_duty_aps::domain::types::{ClinicId, DoctorId, RecurrencePattern};
use clinic_duty_aps::engine::{
    ConstraintEvaluator, CostModel, ScheduleContext, SlotBuilder, Solver,
};

// ==========================================
// 测试辅助函数
// ==========================================

fn doctor(id: DoctorId, cap: u32) -> Doctor {
    Doctor {
        doctor_id: id,
        name: format!("医師{}", id),
        account: String::new(),
        is_active: true,
        max_assignments: cap,
    }
}

fn clinic(id: ClinicId, fee: i64, recurrence: RecurrencePattern) -> Clinic {
    Clinic {
        clinic_id: id,
        name: format!("クリニック{}", id),
        fee,
        recurrence,
        is_active: true,
        nominated_doctors: Vec::new(),
        fixed_doctors: Vec::new(),
    }
}

fn ng_pref(doctor_id: DoctorId, dates: &[NaiveDate]) -> MonthlyPreference {
    MonthlyPreference::new(
        doctor_id,
        dates.iter().copied().collect(),
        BTreeSet::new(),
        BTreeSet::new(),
        BTreeMap::new(),
        String::new(),
    )
}

fn solver() -> Solver {
    Solver::new(
        CostModel::new(WeightProfile::default()),
        DEFAULT_REFINE_PASS_BUDGET,
    )
}

fn build_slots(clinics: &[Clinic], year: i32, month: u32) -> Vec<Slot> {
    let saturdays = calendar::target_saturdays(year, month);
    SlotBuilder::new().build(clinics, &saturdays, &HashMap::new())
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, day).unwrap()
}

// ==========================================
// 场景: 单外勤先×单医师（无冲突）
// ==========================================

#[test]
fn test_single_clinic_single_doctor_full_month() {
    let clinics = vec![clinic(1, 50_000, RecurrencePattern::Weekly)];
    let slots = build_slots(&clinics, 2026, 8);
    let ctx = ScheduleContext::new(vec![doctor(10, 0)], clinics, HashMap::new(), Vec::new());

    let outcome = solver().solve(&ctx, &slots, 0);

    // 2026-08 有 5 个土曜日，全部由该医师出勤
    assert_eq!(slots.len(), 5);
    assert!(outcome.seats.iter().all(|s| s == &vec![10]));
    assert_eq!(outcome.shortage_seats, 0);
    // 满足度 = 槽位数 × 默认优先度 1.0
    assert_eq!(outcome.satisfaction_score, 5.0);
    // 单医师 → 方差 0
    assert_eq!(outcome.total_variance, 0.0);
}

// ==========================================
// 场景: NG 排除
// ==========================================

#[test]
fn test_ng_excludes_even_fixed_doctor() {
    let mut c = clinic(1, 50_000, RecurrencePattern::Weekly);
    c.fixed_doctors = vec![10];
    let clinics = vec![c];
    let slots = build_slots(&clinics, 2026, 8);

    let ctx = ScheduleContext::new(
        vec![doctor(10, 0), doctor(11, 0)],
        clinics,
        HashMap::new(),
        vec![ng_pref(10, &[d(8)])],
    );

    let outcome = solver().solve(&ctx, &slots, 0);

    for (slot, assigned) in slots.iter().zip(outcome.seats.iter()) {
        if slot.date == d(8) {
            // NG日即使是固定医师也不可，改由其他医师充填
            assert!(!assigned.contains(&10));
            assert_eq!(assigned, &vec![11]);
        } else {
            // 其余开诊日固定医师义务成立
            assert!(assigned.contains(&10));
        }
    }
}

#[test]
fn test_ng_with_no_substitute_leaves_slot_short() {
    let clinics = vec![clinic(1, 50_000, RecurrencePattern::Weekly)];
    let slots = build_slots(&clinics, 2026, 8);
    let ctx = ScheduleContext::new(
        vec![doctor(10, 0)],
        clinics,
        HashMap::new(),
        vec![ng_pref(10, &[d(15)])],
    );

    let outcome = solver().solve(&ctx, &slots, 0);

    let short: Vec<_> = slots
        .iter()
        .zip(outcome.seats.iter())
        .filter(|(_, assigned)| assigned.is_empty())
        .map(|(slot, _)| slot.date)
        .collect();
    assert_eq!(short, vec![d(15)]);
    assert_eq!(outcome.shortage_seats, 1);
}

// ==========================================
// 场景: 月度上限
// ==========================================

#[test]
fn test_cap_enforcement_leaves_excess_short() {
    // 2026-02 有 4 个土曜日；上限 2 → 仅出勤 2 回，其余缺口
    let clinics = vec![clinic(1, 50_000, RecurrencePattern::Weekly)];
    let slots = build_slots(&clinics, 2026, 2);
    assert_eq!(slots.len(), 4);

    let ctx = ScheduleContext::new(vec![doctor(10, 2)], clinics, HashMap::new(), Vec::new());
    let outcome = solver().solve(&ctx, &slots, 0);

    let assigned_total: usize = outcome.seats.iter().map(|s| s.len()).sum();
    assert_eq!(assigned_total, 2);
    assert_eq!(outcome.shortage_seats, 2);
}

#[test]
fn test_cap_overflow_goes_to_other_doctor() {
    let clinics = vec![clinic(1, 50_000, RecurrencePattern::Weekly)];
    let slots = build_slots(&clinics, 2026, 8);
    let ctx = ScheduleContext::new(
        vec![doctor(10, 2), doctor(11, 0)],
        clinics,
        HashMap::new(),
        Vec::new(),
    );

    let outcome = solver().solve(&ctx, &slots, 0);

    let count_10 = outcome.seats.iter().filter(|s| s.contains(&10)).count();
    assert!(count_10 <= 2);
    assert_eq!(outcome.shortage_seats, 0);
}

// ==========================================
// 场景: 日别人数设定 (required=2)
// ==========================================

#[test]
fn test_override_two_distinct_doctors() {
    let clinics = vec![clinic(1, 50_000, RecurrencePattern::FirstOnly)];
    let saturdays = calendar::target_saturdays(2026, 8);
    let overrides = HashMap::from([((1, d(1)), 2u32)]);
    let slots = SlotBuilder::new().build(&clinics, &saturdays, &overrides);
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].required, 2);

    let ctx = ScheduleContext::new(
        vec![doctor(10, 0), doctor(11, 0)],
        clinics,
        HashMap::new(),
        Vec::new(),
    );
    let outcome = solver().solve(&ctx, &slots, 0);

    assert_eq!(outcome.seats[0].len(), 2);
    assert_ne!(outcome.seats[0][0], outcome.seats[0][1]);
}

#[test]
fn test_override_two_with_single_doctor_is_short() {
    let clinics = vec![clinic(1, 50_000, RecurrencePattern::FirstOnly)];
    let saturdays = calendar::target_saturdays(2026, 8);
    let overrides = HashMap::from([((1, d(1)), 2u32)]);
    let slots = SlotBuilder::new().build(&clinics, &saturdays, &overrides);

    let ctx = ScheduleContext::new(vec![doctor(10, 0)], clinics, HashMap::new(), Vec::new());
    let outcome = solver().solve(&ctx, &slots, 0);

    assert_eq!(outcome.seats[0], vec![10]);
    assert_eq!(outcome.shortage_seats, 1);
}

// ==========================================
// 场景: 固定医师义务
// ==========================================

#[test]
fn test_fixed_doctor_mandate_honored() {
    let mut c = clinic(1, 50_000, RecurrencePattern::Weekly);
    c.fixed_doctors = vec![11];
    let clinics = vec![c];
    let slots = build_slots(&clinics, 2026, 8);

    let ctx = ScheduleContext::new(
        vec![doctor(10, 0), doctor(11, 0)],
        clinics,
        HashMap::new(),
        Vec::new(),
    );
    let outcome = solver().solve(&ctx, &slots, 0);

    // 只要可出勤，固定医师占据全部开诊日
    assert!(outcome.seats.iter().all(|s| s.contains(&11)));
}

#[test]
fn test_fixed_designation_outranks_never_affinity() {
    let mut c = clinic(1, 50_000, RecurrencePattern::FirstOnly);
    c.fixed_doctors = vec![10];
    let clinics = vec![c];
    let slots = build_slots(&clinics, 2026, 8);

    // 固定指定与「行かない」优先度并存 → 明示的固定指定优先
    let ctx = ScheduleContext::new(
        vec![doctor(10, 0)],
        clinics,
        HashMap::from([((10, 1), 0.0)]),
        Vec::new(),
    );
    let outcome = solver().solve(&ctx, &slots, 0);
    assert_eq!(outcome.seats[0], vec![10]);
}

// ==========================================
// 场景: 「行かない」优先度
// ==========================================

#[test]
fn test_never_affinity_excludes_from_greedy() {
    let clinics = vec![clinic(1, 50_000, RecurrencePattern::Weekly)];
    let slots = build_slots(&clinics, 2026, 8);
    let ctx = ScheduleContext::new(
        vec![doctor(10, 0), doctor(11, 0)],
        clinics,
        HashMap::from([((10, 1), 0.0)]),
        Vec::new(),
    );
    let outcome = solver().solve(&ctx, &slots, 0);

    // 「行かない」排除强于公平性
    assert!(outcome.seats.iter().all(|s| s == &vec![11]));
}

// ==========================================
// 场景: 同日多外勤先
// ==========================================

#[test]
fn test_no_double_booking_same_date() {
    let clinics = vec![
        clinic(1, 50_000, RecurrencePattern::Weekly),
        clinic(2, 30_000, RecurrencePattern::Weekly),
    ];
    let slots = build_slots(&clinics, 2026, 8);
    assert_eq!(slots.len(), 10);

    let ctx = ScheduleContext::new(vec![doctor(10, 0)], clinics, HashMap::new(), Vec::new());
    let outcome = solver().solve(&ctx, &slots, 0);

    // 1 名医师无法同日填满 2 个槽位
    let assigned_total: usize = outcome.seats.iter().map(|s| s.len()).sum();
    assert_eq!(assigned_total, 5);
    assert_eq!(outcome.shortage_seats, 5);

    let evaluator = ConstraintEvaluator::new();
    assert!(evaluator.evaluate(&ctx, &slots, &outcome.seats).is_feasible());
}

// ==========================================
// 场景: 公平性单调性
// ==========================================

#[test]
fn test_fairness_prefers_lower_earner() {
    // clinic1（第1週のみ，高额）由固定医师10占有 →
    // clinic2（最終週のみ）应分给报酬更低的医师11
    let mut c1 = clinic(1, 100_000, RecurrencePattern::FirstOnly);
    c1.fixed_doctors = vec![10];
    let c2 = clinic(2, 10_000, RecurrencePattern::LastOnly);
    let clinics = vec![c1, c2];
    let slots = build_slots(&clinics, 2026, 8);
    assert_eq!(slots.len(), 2);

    let ctx = ScheduleContext::new(
        vec![doctor(10, 0), doctor(11, 0)],
        clinics,
        HashMap::new(),
        Vec::new(),
    );
    let outcome = solver().solve(&ctx, &slots, 0);

    let last_slot_index = slots.iter().position(|s| s.clinic_id == 2).unwrap();
    assert_eq!(outcome.seats[last_slot_index], vec![11]);
}

// ==========================================
// 场景: 再现性
// ==========================================

#[test]
fn test_same_seed_is_deterministic() {
    let clinics = vec![
        clinic(1, 50_000, RecurrencePattern::Weekly),
        clinic(2, 30_000, RecurrencePattern::BiweeklyOdd),
    ];
    let slots = build_slots(&clinics, 2026, 8);
    let doctors = vec![doctor(10, 0), doctor(11, 0), doctor(12, 3)];

    let ctx1 = ScheduleContext::new(doctors.clone(), clinics.clone(), HashMap::new(), Vec::new());
    let ctx2 = ScheduleContext::new(doctors, clinics, HashMap::new(), Vec::new());

    let outcome1 = solver().solve(&ctx1, &slots, 42);
    let outcome2 = solver().solve(&ctx2, &slots, 42);

    assert_eq!(outcome1.seats, outcome2.seats);
    assert_eq!(outcome1.satisfaction_score, outcome2.satisfaction_score);
    assert_eq!(outcome1.total_variance, outcome2.total_variance);
}

// ==========================================
// 场景: 零医师
// ==========================================

#[test]
fn test_no_doctors_yields_empty_plan() {
    let clinics = vec![clinic(1, 50_000, RecurrencePattern::Weekly)];
    let slots = build_slots(&clinics, 2026, 8);
    let ctx = ScheduleContext::new(Vec::new(), clinics, HashMap::new(), Vec::new());

    let outcome = solver().solve(&ctx, &slots, 0);

    assert!(outcome.seats.iter().all(|s| s.is_empty()));
    assert_eq!(outcome.satisfaction_score, 0.0);
    assert_eq!(outcome.total_variance, 0.0);
    assert_eq!(outcome.shortage_seats, 5);
}

// ==========================================
// 硬约束健全性（求解结果全件判定）
// ==========================================

#[test]
fn test_solver_output_is_always_hard_feasible() {
    let mut c1 = clinic(1, 80_000, RecurrencePattern::Weekly);
    c1.fixed_doctors = vec![10];
    let clinics = vec![
        c1,
        clinic(2, 30_000, RecurrencePattern::BiweeklyEven),
        clinic(3, 50_000, RecurrencePattern::Weekly),
    ];
    let slots = build_slots(&clinics, 2026, 8);
    let ctx = ScheduleContext::new(
        vec![doctor(10, 3), doctor(11, 0), doctor(12, 2), doctor(13, 0)],
        clinics,
        HashMap::from([((11, 3), 2.0), ((13, 2), 0.0)]),
        vec![ng_pref(11, &[d(1), d(8)]), ng_pref(12, &[d(29)])],
    );

    let evaluator = ConstraintEvaluator::new();
    for seed in 0..5u64 {
        let outcome = solver().solve(&ctx, &slots, seed);
        let report = evaluator.evaluate(&ctx, &slots, &outcome.seats);
        assert!(
            report.is_feasible(),
            "seed={} violations={:?}",
            seed,
            report.violations
        );
    }
}
