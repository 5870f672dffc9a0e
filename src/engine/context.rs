// ==========================================
// 外勤医师排班系统 - 排班上下文
// ==========================================
// 职责: 求解一次所需的全部只读输入（医师/外勤先/优先度/希望）
// 红线: 构造时完成引用完整性清洗，引擎内不再出现未知ID
// ==========================================

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::clinic::Clinic;
use crate::domain::doctor::Doctor;
use crate::domain::preference::MonthlyPreference;
use crate::domain::types::{ClinicId, DoctorId};

// ==========================================
// ScheduleContext - 排班只读上下文
// ==========================================
pub struct ScheduleContext {
    doctors: BTreeMap<DoctorId, Doctor>,
    clinics: BTreeMap<ClinicId, Clinic>,
    preferences: HashMap<DoctorId, MonthlyPreference>,
    affinities: HashMap<(DoctorId, ClinicId), f64>,
}

impl ScheduleContext {
    /// 构造上下文并清洗引用完整性
    ///
    /// # 规则
    /// - 非在职医师/非启用外勤先不进入上下文
    /// - 外勤先的固定/希望医师列表中未知ID直接剔除（容错而非中断）
    /// - 未知医师的希望/优先度行丢弃
    pub fn new(
        doctors: Vec<Doctor>,
        clinics: Vec<Clinic>,
        affinities: HashMap<(DoctorId, ClinicId), f64>,
        preferences: Vec<MonthlyPreference>,
    ) -> Self {
        let doctors: BTreeMap<DoctorId, Doctor> = doctors
            .into_iter()
            .filter(|d| d.is_active)
            .map(|d| (d.doctor_id, d))
            .collect();

        let clinics: BTreeMap<ClinicId, Clinic> = clinics
            .into_iter()
            .filter(|c| c.is_active)
            .map(|mut c| {
                let before = c.fixed_doctors.len() + c.nominated_doctors.len();
                c.fixed_doctors.retain(|id| doctors.contains_key(id));
                c.nominated_doctors.retain(|id| doctors.contains_key(id));
                let after = c.fixed_doctors.len() + c.nominated_doctors.len();
                if after < before {
                    warn!(
                        clinic_id = c.clinic_id,
                        dropped = before - after,
                        "外勤先引用了未知/非在职医师ID，已剔除"
                    );
                }
                (c.clinic_id, c)
            })
            .collect();

        let preferences = preferences
            .into_iter()
            .filter(|p| doctors.contains_key(&p.doctor_id))
            .map(|p| (p.doctor_id, p))
            .collect();

        let affinities = affinities
            .into_iter()
            .filter(|((doctor_id, _), _)| doctors.contains_key(doctor_id))
            .collect();

        Self {
            doctors,
            clinics,
            preferences,
            affinities,
        }
    }

    /// 在职医师ID（ID 升序，保证迭代顺序确定）
    pub fn doctor_ids(&self) -> Vec<DoctorId> {
        self.doctors.keys().copied().collect()
    }

    /// 在职医师数
    pub fn doctor_count(&self) -> usize {
        self.doctors.len()
    }

    pub fn doctor(&self, doctor_id: DoctorId) -> Option<&Doctor> {
        self.doctors.get(&doctor_id)
    }

    pub fn clinic(&self, clinic_id: ClinicId) -> Option<&Clinic> {
        self.clinics.get(&clinic_id)
    }

    /// 优先度权重（无行 = 默认 1.0）
    pub fn affinity(&self, doctor_id: DoctorId, clinic_id: ClinicId) -> f64 {
        self.affinities
            .get(&(doctor_id, clinic_id))
            .copied()
            .unwrap_or(1.0)
    }

    /// 该日是否出勤不可（未提交希望 = 全日可）
    pub fn is_ng(&self, doctor_id: DoctorId, date: NaiveDate) -> bool {
        self.preferences
            .get(&doctor_id)
            .map(|p| p.is_ng(date))
            .unwrap_or(false)
    }

    /// 该日是否希望回避
    pub fn wants_to_avoid(&self, doctor_id: DoctorId, date: NaiveDate) -> bool {
        self.preferences
            .get(&doctor_id)
            .map(|p| p.wants_to_avoid(date))
            .unwrap_or(false)
    }

    /// 是否希望该外勤先
    pub fn prefers_clinic(&self, doctor_id: DoctorId, clinic_id: ClinicId) -> bool {
        self.preferences
            .get(&doctor_id)
            .map(|p| p.preferred_clinics.contains(&clinic_id))
            .unwrap_or(false)
    }

    /// 该日的日别指定希望外勤先
    pub fn requested_clinic(&self, doctor_id: DoctorId, date: NaiveDate) -> Option<ClinicId> {
        self.preferences
            .get(&doctor_id)
            .and_then(|p| p.requested_clinic(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::RecurrencePattern;
    use std::collections::BTreeSet;

    fn doctor(id: DoctorId, active: bool) -> Doctor {
        Doctor {
            doctor_id: id,
            name: format!("医師{}", id),
            account: String::new(),
            is_active: active,
            max_assignments: 0,
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

    #[test]
    fn test_unknown_fixed_doctor_is_dropped() {
        let ctx = ScheduleContext::new(
            vec![doctor(1, true), doctor(2, false)],
            vec![clinic(10, vec![1, 2, 99])],
            HashMap::new(),
            Vec::new(),
        );
        // 非在职(2)与未知(99)被剔除，仅在职(1)保留
        assert_eq!(ctx.clinic(10).unwrap().fixed_doctors, vec![1]);
        assert_eq!(ctx.doctor_count(), 1);
    }

    #[test]
    fn test_affinity_defaults_to_sometimes() {
        let ctx = ScheduleContext::new(
            vec![doctor(1, true)],
            vec![clinic(10, Vec::new())],
            HashMap::from([((1, 10), 2.0)]),
            Vec::new(),
        );
        assert_eq!(ctx.affinity(1, 10), 2.0);
        assert_eq!(ctx.affinity(1, 11), 1.0);
    }

    #[test]
    fn test_missing_preference_means_available() {
        let ctx = ScheduleContext::new(
            vec![doctor(1, true)],
            vec![],
            HashMap::new(),
            vec![MonthlyPreference::new(
                1,
                [NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()].into_iter().collect(),
                BTreeSet::new(),
                BTreeSet::new(),
                Default::default(),
                String::new(),
            )],
        );
        assert!(ctx.is_ng(1, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()));
        assert!(!ctx.is_ng(1, NaiveDate::from_ymd_opt(2026, 8, 8).unwrap()));
    }
}
