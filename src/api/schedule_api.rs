// ==========================================
// 外勤医师排班系统 - 排班 API
// ==========================================
// 职责: 方案生成、方案生命周期、累计报酬集计
// 数据流: 仓储 → SlotBuilder → Solver → PlanReporter → 仓储（单向）
// ==========================================

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::calendar;
use crate::config::ConfigManager;
use crate::domain::plan::{PlanAssignment, SchedulePlan};
use crate::domain::slot::Slot;
use crate::domain::types::DoctorId;
use crate::engine::{CostModel, PlanReporter, ScheduleContext, SlotBuilder, Solver};
use crate::repository::{
    AffinityRepository, ClinicRepository, DoctorRepository, OverrideRepository, PlanRepository,
    PreferenceRepository, RepositoryError, RepositoryResult,
};

// ==========================================
// DoctorIncome - 医师累计报酬
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorIncome {
    pub doctor_id: DoctorId,           // 医师ID
    pub name: String,                  // 姓名
    pub monthly: BTreeMap<String, i64>, // 年月 → 当月报酬
    pub total_fee: i64,                // 累计报酬
}

// ==========================================
// ScheduleApi - 排班 API
// ==========================================
pub struct ScheduleApi {
    doctor_repo: DoctorRepository,
    clinic_repo: ClinicRepository,
    affinity_repo: AffinityRepository,
    override_repo: OverrideRepository,
    preference_repo: PreferenceRepository,
    plan_repo: PlanRepository,
    config: ConfigManager,
}

impl ScheduleApi {
    /// 创建新的 ScheduleApi 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            doctor_repo: DoctorRepository::new(conn.clone()),
            clinic_repo: ClinicRepository::new(conn.clone()),
            affinity_repo: AffinityRepository::new(conn.clone()),
            override_repo: OverrideRepository::new(conn.clone()),
            preference_repo: PreferenceRepository::new(conn.clone()),
            plan_repo: PlanRepository::new(conn.clone()),
            config: ConfigManager::new(conn),
        }
    }

    /// 生成候选方案并保存
    ///
    /// # 参数
    /// - year/month: 对象年月
    /// - plan_name: 方案名（同月同名幂等覆盖，确定状态不变）
    /// - seed: 平局打破种子（变更种子可得到另一候选）
    ///
    /// # 返回
    /// 持久化后的方案（覆盖时 plan_id 为既存值）
    #[instrument(skip(self))]
    pub fn generate_plan(
        &self,
        year: i32,
        month: u32,
        plan_name: &str,
        seed: u64,
    ) -> RepositoryResult<SchedulePlan> {
        if plan_name.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "方案名不能为空".to_string(),
            ));
        }

        let year_month = calendar::year_month(year, month);
        let saturdays = calendar::target_saturdays(year, month);

        let doctors = self.doctor_repo.list(true)?;
        let clinics = self.clinic_repo.list(true)?;
        let affinities = self.affinity_repo.weight_map()?;
        let preferences = self.preference_repo.list_by_month(&year_month)?;
        let overrides = self.override_repo.month_map(&year_month)?;

        let slots = SlotBuilder::new().build(&clinics, &saturdays, &overrides);
        let ctx = ScheduleContext::new(doctors, clinics, affinities, preferences);

        let weights = self.config.get_weight_profile()?;
        let budget = self.config.get_refine_pass_budget()?;
        let solver = Solver::new(CostModel::new(weights), budget);
        let outcome = solver.solve(&ctx, &slots, seed);

        let plan = PlanReporter::new().build_plan(&year_month, plan_name, &slots, &outcome);
        let saved = self.plan_repo.save(&plan)?;

        info!(
            plan_id = %saved.plan_id,
            assignments = saved.assignment_count(),
            has_shortage = saved.has_shortage,
            "方案生成完成"
        );
        Ok(saved)
    }

    /// 指定月的候选方案一览（新建在前）
    pub fn list_plans(&self, year: i32, month: u32) -> RepositoryResult<Vec<SchedulePlan>> {
        self.plan_repo.list_by_month(&calendar::year_month(year, month))
    }

    /// 确定方案（同月其他方案的确定标志同时清除）
    pub fn confirm_plan(&self, plan_id: &str) -> RepositoryResult<()> {
        self.plan_repo.confirm(plan_id)
    }

    /// 删除方案
    pub fn delete_plan(&self, plan_id: &str) -> RepositoryResult<()> {
        self.plan_repo.delete(plan_id)
    }

    /// 再编辑方案明细（指标经成本模型重算后保存）
    ///
    /// # 返回
    /// 重算指标后的方案
    pub fn update_plan_assignments(
        &self,
        plan_id: &str,
        assignments: Vec<PlanAssignment>,
    ) -> RepositoryResult<SchedulePlan> {
        let plan = self.plan_repo.find_by_id(plan_id)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "SchedulePlan".to_string(),
                id: plan_id.to_string(),
            }
        })?;

        // 再编辑后的指标用当前主数据重算（方案指标始终可信）
        let doctors = self.doctor_repo.list(true)?;
        let clinics = self.clinic_repo.list(true)?;
        let affinities = self.affinity_repo.weight_map()?;
        let preferences = self.preference_repo.list_by_month(&plan.year_month)?;

        let fee_map: BTreeMap<i64, i64> =
            clinics.iter().map(|c| (c.clinic_id, c.fee)).collect();
        let slots: Vec<Slot> = assignments
            .iter()
            .map(|a| Slot {
                clinic_id: a.clinic_id,
                date: a.date,
                required: a.required,
                fee: fee_map.get(&a.clinic_id).copied().unwrap_or(0),
            })
            .collect();
        let seats: Vec<Vec<DoctorId>> =
            assignments.iter().map(|a| a.doctor_ids.clone()).collect();

        let ctx = ScheduleContext::new(doctors, clinics, affinities, preferences);
        let model = CostModel::new(self.config.get_weight_profile()?);
        let total_variance = model.fee_variance(&ctx, &slots, &seats);
        let satisfaction_score = model.satisfaction(&ctx, &slots, &seats);

        self.plan_repo
            .update_assignments(plan_id, &assignments, total_variance, satisfaction_score)?;
        self.plan_repo.find_by_id(plan_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "SchedulePlan".to_string(),
            id: plan_id.to_string(),
        })
    }

    /// 全月确定方案的医师别累计报酬集计
    ///
    /// 报酬 = 分配槽位的外勤先日给合计（外勤先主数据的当前值）
    pub fn income_summary(&self) -> RepositoryResult<Vec<DoctorIncome>> {
        let doctors = self.doctor_repo.list(false)?;
        let clinics = self.clinic_repo.list(false)?;
        let confirmed = self.plan_repo.list_confirmed()?;

        let fee_map: BTreeMap<i64, i64> =
            clinics.iter().map(|c| (c.clinic_id, c.fee)).collect();

        let mut incomes: BTreeMap<DoctorId, DoctorIncome> = doctors
            .iter()
            .map(|d| {
                (
                    d.doctor_id,
                    DoctorIncome {
                        doctor_id: d.doctor_id,
                        name: d.name.clone(),
                        monthly: BTreeMap::new(),
                        total_fee: 0,
                    },
                )
            })
            .collect();

        for plan in &confirmed {
            for assignment in &plan.assignments {
                let fee = fee_map.get(&assignment.clinic_id).copied().unwrap_or(0);
                for doctor_id in &assignment.doctor_ids {
                    // 已删除医师的分配不计入集计
                    if let Some(income) = incomes.get_mut(doctor_id) {
                        *income.monthly.entry(plan.year_month.clone()).or_insert(0) += fee;
                        income.total_fee += fee;
                    }
                }
            }
        }

        Ok(incomes.into_values().collect())
    }

    /// 存在确定方案的年月一览
    pub fn confirmed_months(&self) -> RepositoryResult<Vec<String>> {
        self.plan_repo.confirmed_months()
    }
}
