// ==========================================
// 外勤医师排班系统 - 排班求解引擎
// ==========================================
// 职责: 在硬约束下搜索成本最小的 槽位→医师 分配
// 算法: 固定医师播种 → 贪欲构筑 → 局部搜索改善（轮数有界）
// 红线:
// - 同一输入＋同一种子 → 逐字节一致的结果（再现性）
// - 无可行医师的席位保留缺口返回，不视为失败（降级运行）
// ==========================================

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, instrument};

use crate::domain::slot::Slot;
use crate::domain::types::DoctorId;
use crate::engine::constraint::ConstraintEvaluator;
use crate::engine::context::ScheduleContext;
use crate::engine::cost::CostModel;

/// 成本改善判定的容差（浮点比较）
const IMPROVEMENT_EPS: f64 = 1e-9;

// ==========================================
// SolveOutcome - 求解结果
// ==========================================
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// seats[i] 与输入 slots[i] 一一对应（席位顺）
    pub seats: Vec<Vec<DoctorId>>,
    /// 满足度指标（未加权原始值）
    pub satisfaction_score: f64,
    /// 公平性指标（月度报酬方差，原始货币单位）
    pub total_variance: f64,
    /// 合成目标值（最小化对象）
    pub total_cost: f64,
    /// 人员缺口席位数
    pub shortage_seats: usize,
    /// 局部搜索实际消化轮数
    pub refine_passes: usize,
}

impl SolveOutcome {
    pub fn has_shortage(&self) -> bool {
        self.shortage_seats > 0
    }
}

// ==========================================
// Solver - 排班求解引擎
// ==========================================
pub struct Solver {
    evaluator: ConstraintEvaluator,
    cost: CostModel,
    refine_pass_budget: usize,
}

impl Solver {
    /// 构造函数
    ///
    /// # 参数
    /// - cost: 成本模型
    /// - refine_pass_budget: 局部搜索改善轮数上限
    pub fn new(cost: CostModel, refine_pass_budget: usize) -> Self {
        Self {
            evaluator: ConstraintEvaluator::new(),
            cost,
            refine_pass_budget,
        }
    }

    /// 求解当月分配
    ///
    /// # 参数
    /// - ctx: 只读排班上下文
    /// - slots: SlotBuilder 输出（(日付, 外勤先ID) 升序前提）
    /// - seed: 平局打破种子（不同种子 → 不同候选方案）
    #[instrument(skip(self, ctx, slots), fields(
        doctors = ctx.doctor_count(),
        slot_count = slots.len()
    ))]
    pub fn solve(&self, ctx: &ScheduleContext, slots: &[Slot], seed: u64) -> SolveOutcome {
        let mut seats: Vec<Vec<DoctorId>> = vec![Vec::new(); slots.len()];

        // 零医师: 返回全席缺口的空方案（有效的降级输出）
        if ctx.doctor_count() == 0 {
            info!("在职医师为零，返回全缺口空方案");
            return self.finish(ctx, slots, seats, 0);
        }

        // 种子化平局打破顺位（同一种子 → 同一顺位）
        let tie_break_rank = Self::tie_break_rank(ctx, seed);

        self.seed_fixed_doctors(ctx, slots, &mut seats);
        self.greedy_fill(ctx, slots, &mut seats, &tie_break_rank);
        let refine_passes = self.refine(ctx, slots, &mut seats);

        self.finish(ctx, slots, seats, refine_passes)
    }

    /// 种子化洗牌顺位（值越小优先）
    fn tie_break_rank(ctx: &ScheduleContext, seed: u64) -> HashMap<DoctorId, usize> {
        let mut ids = ctx.doctor_ids();
        let mut rng = StdRng::seed_from_u64(seed);
        ids.shuffle(&mut rng);
        ids.into_iter().enumerate().map(|(rank, id)| (id, rank)).collect()
    }

    // ==========================================
    // 阶段1: 固定医师播种
    // ==========================================

    /// 对每个槽位预先放置可出勤的固定医师
    ///
    /// 规则: 非NG、当日未被占用、上限未达的固定医师必须占席
    /// （不可出勤时义务消灭，该席落回贪欲充填）
    fn seed_fixed_doctors(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: &mut [Vec<DoctorId>],
    ) {
        for index in 0..slots.len() {
            let clinic = match ctx.clinic(slots[index].clinic_id) {
                Some(c) => c,
                None => continue,
            };
            // 固定指定强于「行かない」优先度，经 seat_feasible 而非 seat_placeable
            for &fixed_id in &clinic.fixed_doctors {
                if self.evaluator.seat_feasible(ctx, slots, seats, index, fixed_id) {
                    debug!(
                        doctor_id = fixed_id,
                        clinic_id = slots[index].clinic_id,
                        date = %slots[index].date,
                        "固定医师播种"
                    );
                    seats[index].push(fixed_id);
                }
            }
        }
    }

    // ==========================================
    // 阶段2: 贪欲构筑
    // ==========================================

    /// 按日付、槽位顺充填残余席位
    ///
    /// 选择基准: 边际成本最小；平局按
    /// (a) 当前分配次数少 → (b) 种子化顺位 → (c) 医师ID
    fn greedy_fill(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: &mut [Vec<DoctorId>],
        tie_break_rank: &HashMap<DoctorId, usize>,
    ) {
        let doctor_ids = ctx.doctor_ids();

        for index in 0..slots.len() {
            while seats[index].len() < slots[index].required as usize {
                let fee_totals = self.cost.fee_totals(ctx, slots, seats);
                let assign_counts = Self::assignment_counts(seats);

                let best = doctor_ids
                    .iter()
                    .copied()
                    .filter(|&id| self.evaluator.seat_placeable(ctx, slots, seats, index, id))
                    .min_by(|&a, &b| {
                        let cost_a = self.cost.marginal_cost(ctx, &fee_totals, &slots[index], a);
                        let cost_b = self.cost.marginal_cost(ctx, &fee_totals, &slots[index], b);
                        cost_a
                            .total_cmp(&cost_b)
                            .then_with(|| {
                                let count_a = assign_counts.get(&a).copied().unwrap_or(0);
                                let count_b = assign_counts.get(&b).copied().unwrap_or(0);
                                count_a.cmp(&count_b)
                            })
                            .then_with(|| {
                                let rank_a = tie_break_rank.get(&a).copied().unwrap_or(usize::MAX);
                                let rank_b = tie_break_rank.get(&b).copied().unwrap_or(usize::MAX);
                                rank_a.cmp(&rank_b)
                            })
                            .then_with(|| a.cmp(&b))
                    });

                match best {
                    Some(doctor_id) => seats[index].push(doctor_id),
                    None => {
                        // 可行医师耗尽的席位保留缺口（降级运行）
                        debug!(
                            clinic_id = slots[index].clinic_id,
                            date = %slots[index].date,
                            assigned = seats[index].len(),
                            required = slots[index].required,
                            "可行医师不足，席位保留缺口"
                        );
                        break;
                    }
                }
            }
        }
    }

    fn assignment_counts(seats: &[Vec<DoctorId>]) -> HashMap<DoctorId, usize> {
        let mut counts = HashMap::new();
        for assigned in seats {
            for &id in assigned {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        counts
    }

    // ==========================================
    // 阶段3: 局部搜索改善
    // ==========================================

    /// 反复尝试改善手（成本严格下降时采用），无改善或轮数耗尽为止
    ///
    /// 改善手种类:
    /// 1) 缺口席位充填（因其他改善手而重新可行的席位）
    /// 2) 单席换人（在席医师 → 其他医师）
    /// 3) 两席交换（不同槽位间医师互换）
    fn refine(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: &mut Vec<Vec<DoctorId>>,
    ) -> usize {
        let doctor_ids = ctx.doctor_ids();
        let mut current_cost = self.cost.total_cost(ctx, slots, seats);
        let mut passes = 0;

        while passes < self.refine_pass_budget {
            passes += 1;
            let mut improved = false;

            // 1) 缺口席位充填（充填本身始终视为改善: 缺口解消最优先）
            for index in 0..slots.len() {
                while seats[index].len() < slots[index].required as usize {
                    let fee_totals = self.cost.fee_totals(ctx, slots, seats);
                    let candidate = doctor_ids
                        .iter()
                        .copied()
                        .filter(|&id| self.evaluator.seat_placeable(ctx, slots, seats, index, id))
                        .min_by(|&a, &b| {
                            self.cost
                                .marginal_cost(ctx, &fee_totals, &slots[index], a)
                                .total_cmp(&self.cost.marginal_cost(ctx, &fee_totals, &slots[index], b))
                                .then_with(|| a.cmp(&b))
                        });
                    match candidate {
                        Some(id) => {
                            seats[index].push(id);
                            improved = true;
                        }
                        None => break,
                    }
                }
            }

            // 2) 单席换人
            for index in 0..slots.len() {
                for seat_pos in 0..seats[index].len() {
                    let incumbent = seats[index][seat_pos];
                    for &candidate in &doctor_ids {
                        if candidate == incumbent {
                            continue;
                        }
                        let mut trial = seats.clone();
                        trial[index].remove(seat_pos);
                        if !self.evaluator.seat_placeable(ctx, slots, &trial, index, candidate) {
                            continue;
                        }
                        trial[index].insert(seat_pos, candidate);
                        if !self.accepts(ctx, slots, &trial) {
                            continue;
                        }
                        let trial_cost = self.cost.total_cost(ctx, slots, &trial);
                        if trial_cost < current_cost - IMPROVEMENT_EPS {
                            *seats = trial;
                            current_cost = trial_cost;
                            improved = true;
                            break;
                        }
                    }
                }
            }

            // 3) 两席交换
            for i in 0..slots.len() {
                for j in (i + 1)..slots.len() {
                    for pos_i in 0..seats[i].len() {
                        for pos_j in 0..seats[j].len() {
                            let mut trial = seats.clone();
                            let doctor_i = trial[i][pos_i];
                            let doctor_j = trial[j][pos_j];
                            if doctor_i == doctor_j {
                                continue;
                            }
                            trial[i][pos_i] = doctor_j;
                            trial[j][pos_j] = doctor_i;
                            if !self.accepts(ctx, slots, &trial) {
                                continue;
                            }
                            // 交换后仍需尊重「行かない」优先度
                            if ctx.affinity(doctor_j, slots[i].clinic_id) <= 0.0
                                || ctx.affinity(doctor_i, slots[j].clinic_id) <= 0.0
                            {
                                continue;
                            }
                            let trial_cost = self.cost.total_cost(ctx, slots, &trial);
                            if trial_cost < current_cost - IMPROVEMENT_EPS {
                                *seats = trial;
                                current_cost = trial_cost;
                                improved = true;
                            }
                        }
                    }
                }
            }

            if !improved {
                break;
            }
        }

        passes
    }

    /// 改善手的硬规则门卫（方差、满足度计算之前先过滤）
    fn accepts(&self, ctx: &ScheduleContext, slots: &[Slot], seats: &[Vec<DoctorId>]) -> bool {
        self.evaluator.evaluate(ctx, slots, seats).is_feasible()
    }

    // ==========================================
    // 结果打包
    // ==========================================

    fn finish(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: Vec<Vec<DoctorId>>,
        refine_passes: usize,
    ) -> SolveOutcome {
        let satisfaction_score = self.cost.satisfaction(ctx, slots, &seats);
        let total_variance = self.cost.fee_variance(ctx, slots, &seats);
        let total_cost = self.cost.total_cost(ctx, slots, &seats);
        let shortage_seats = slots
            .iter()
            .zip(seats.iter())
            .map(|(slot, assigned)| (slot.required as usize).saturating_sub(assigned.len()))
            .sum();

        let outcome = SolveOutcome {
            seats,
            satisfaction_score,
            total_variance,
            total_cost,
            shortage_seats,
            refine_passes,
        };
        info!(
            satisfaction = outcome.satisfaction_score,
            variance = outcome.total_variance,
            shortage_seats = outcome.shortage_seats,
            refine_passes = outcome.refine_passes,
            "求解完成"
        );
        outcome
    }
}
