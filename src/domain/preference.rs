// ==========================================
// 外勤医师排班系统 - 月别希望领域模型
// ==========================================
// 红线: 仓储层边界完成 JSON → 强类型转换，引擎层不接触弱类型数据
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::types::{ClinicId, DoctorId};

// ==========================================
// MonthlyPreference - 医师月别希望
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyPreference {
    pub doctor_id: DoctorId,                              // 医师ID
    pub ng_dates: BTreeSet<NaiveDate>,                    // NG日（硬约束，出勤不可）
    pub avoid_dates: BTreeSet<NaiveDate>,                 // 回避希望日（软约束，可强制分配）
    pub preferred_clinics: BTreeSet<ClinicId>,            // 希望外勤先（软加分）
    pub date_clinic_requests: BTreeMap<NaiveDate, ClinicId>, // 日别指定希望（软加分，强于上项）
    pub free_text: String,                                // 备注（引擎不消费）
    pub updated_at: Option<NaiveDateTime>,                // 最终更新时刻
}

impl MonthlyPreference {
    /// 构造并规范化
    ///
    /// # 规则
    /// - 同一日同时出现在 NG 与回避集合时，NG 优先（回避集合中剔除）
    pub fn new(
        doctor_id: DoctorId,
        ng_dates: BTreeSet<NaiveDate>,
        avoid_dates: BTreeSet<NaiveDate>,
        preferred_clinics: BTreeSet<ClinicId>,
        date_clinic_requests: BTreeMap<NaiveDate, ClinicId>,
        free_text: String,
    ) -> Self {
        let avoid_dates = avoid_dates.difference(&ng_dates).copied().collect();
        Self {
            doctor_id,
            ng_dates,
            avoid_dates,
            preferred_clinics,
            date_clinic_requests,
            free_text,
            updated_at: None,
        }
    }

    /// 未提交希望的医师视为全日可出勤
    pub fn empty(doctor_id: DoctorId) -> Self {
        Self {
            doctor_id,
            ng_dates: BTreeSet::new(),
            avoid_dates: BTreeSet::new(),
            preferred_clinics: BTreeSet::new(),
            date_clinic_requests: BTreeMap::new(),
            free_text: String::new(),
            updated_at: None,
        }
    }

    /// 该日是否出勤不可
    pub fn is_ng(&self, date: NaiveDate) -> bool {
        self.ng_dates.contains(&date)
    }

    /// 该日是否希望回避
    pub fn wants_to_avoid(&self, date: NaiveDate) -> bool {
        self.avoid_dates.contains(&date)
    }

    /// 该日是否指定了希望外勤先
    pub fn requested_clinic(&self, date: NaiveDate) -> Option<ClinicId> {
        self.date_clinic_requests.get(&date).copied()
    }
}
