// ==========================================
// 外勤医师排班系统 - 成本模型引擎
// ==========================================
// 职责: 完整/部分分配的标量目标值计算（最小化）
// 构成: 公平性项（月度报酬方差）＋ 满足度项（取负号计入）
// 红线: 公平性权重主导平局，满足度打破残余平局
// ==========================================

use std::collections::HashMap;

use crate::config::WeightProfile;
use crate::domain::slot::Slot;
use crate::domain::types::DoctorId;
use crate::engine::context::ScheduleContext;

/// 报酬缩放单位（万円）
///
/// 方差项在目标函数内按缩放后报酬计算，使默认权重下
/// 公平性项与满足度项处于同一数量级；对外报告的
/// total_variance 保持原始货币单位
pub const FEE_SCALE: f64 = 10_000.0;

// ==========================================
// CostModel - 成本模型引擎
// ==========================================
pub struct CostModel {
    weights: WeightProfile,
}

impl CostModel {
    /// 构造函数
    pub fn new(weights: WeightProfile) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &WeightProfile {
        &self.weights
    }

    /// 单席的满足度贡献
    ///
    /// # 构成
    /// - 优先度权重（无行 = 1.0）
    /// - 希望外勤先加分
    /// - 日别指定希望加分（指定一致时）
    /// - 回避希望日扣分（软约束）
    pub fn seat_satisfaction(
        &self,
        ctx: &ScheduleContext,
        slot: &Slot,
        doctor_id: DoctorId,
    ) -> f64 {
        let mut score = ctx.affinity(doctor_id, slot.clinic_id);
        if ctx.prefers_clinic(doctor_id, slot.clinic_id) {
            score += self.weights.preferred_clinic_bonus;
        }
        if ctx.requested_clinic(doctor_id, slot.date) == Some(slot.clinic_id) {
            score += self.weights.date_request_bonus;
        }
        if ctx.wants_to_avoid(doctor_id, slot.date) {
            score -= self.weights.avoid_penalty;
        }
        score
    }

    /// 方案全体的满足度（未加权原始值，方案指标 satisfaction_score）
    pub fn satisfaction(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: &[Vec<DoctorId>],
    ) -> f64 {
        slots
            .iter()
            .zip(seats.iter())
            .flat_map(|(slot, assigned)| {
                assigned.iter().map(|&id| self.seat_satisfaction(ctx, slot, id))
            })
            .sum()
    }

    /// 医师别月度报酬合计（原始货币单位）
    pub fn fee_totals(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: &[Vec<DoctorId>],
    ) -> HashMap<DoctorId, i64> {
        let mut totals: HashMap<DoctorId, i64> =
            ctx.doctor_ids().into_iter().map(|id| (id, 0)).collect();
        for (slot, assigned) in slots.iter().zip(seats.iter()) {
            for doctor_id in assigned {
                if let Some(total) = totals.get_mut(doctor_id) {
                    *total += slot.fee;
                }
            }
        }
        totals
    }

    /// 公平性指标: 在职医师月度报酬的母集团方差（原始货币单位）
    ///
    /// 无分配的在职医师也计入（报酬 0 参与方差），
    /// 将高报酬集中于少数医师的方案劣后
    pub fn fee_variance(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: &[Vec<DoctorId>],
    ) -> f64 {
        let totals = self.fee_totals(ctx, slots, seats);
        let n = totals.len();
        if n == 0 {
            return 0.0;
        }
        let mean = totals.values().map(|&v| v as f64).sum::<f64>() / n as f64;
        totals
            .values()
            .map(|&v| {
                let diff = v as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / n as f64
    }

    /// 标量目标值（最小化对象）
    ///
    /// total_cost = fairness_weight × 缩放方差 − satisfaction_weight × 满足度
    pub fn total_cost(
        &self,
        ctx: &ScheduleContext,
        slots: &[Slot],
        seats: &[Vec<DoctorId>],
    ) -> f64 {
        let scaled_variance = self.fee_variance(ctx, slots, seats) / (FEE_SCALE * FEE_SCALE);
        self.weights.fairness_weight * scaled_variance
            - self.weights.satisfaction_weight * self.satisfaction(ctx, slots, seats)
    }

    /// 贪欲充填用: 候选 (医师, 槽位) 的边际成本
    ///
    /// 方差项增量: 报酬 f 追加给医师 d 时，Σx² 增加 2·t_d·f + f²
    /// （均值的变化对所有候选相同，不影响比较）
    pub fn marginal_cost(
        &self,
        ctx: &ScheduleContext,
        fee_totals: &HashMap<DoctorId, i64>,
        slot: &Slot,
        doctor_id: DoctorId,
    ) -> f64 {
        let n = ctx.doctor_count().max(1) as f64;
        let current = fee_totals.get(&doctor_id).copied().unwrap_or(0) as f64 / FEE_SCALE;
        let fee = slot.fee as f64 / FEE_SCALE;
        let variance_delta = (2.0 * current * fee + fee * fee) / n;

        self.weights.fairness_weight * variance_delta
            - self.weights.satisfaction_weight * self.seat_satisfaction(ctx, slot, doctor_id)
    }
}
