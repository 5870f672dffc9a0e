// ==========================================
// 外勤医师排班系统 - 医师领域模型
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::DoctorId;

// ==========================================
// Doctor - 医师主数据
// ==========================================
// 红线: 医师由管理员创建/停用，月中不物理删除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub doctor_id: DoctorId,  // 医师ID
    pub name: String,         // 姓名
    pub account: String,      // 登录账号（认证本身不在本库范围）
    pub is_active: bool,      // 在职标志
    pub max_assignments: u32, // 月度出勤上限 (0 = 不设限)
}

impl Doctor {
    /// 判断是否设有月度上限
    pub fn has_cap(&self) -> bool {
        self.max_assignments > 0
    }

    /// 判断给定出勤次数下是否仍可追加一次出勤
    pub fn cap_allows(&self, current_count: usize) -> bool {
        !self.has_cap() || current_count < self.max_assignments as usize
    }
}
