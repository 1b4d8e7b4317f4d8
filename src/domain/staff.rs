// ==========================================
// 剧院制作后台 - 员工与身份戳
// ==========================================

use crate::domain::types::StaffRole;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Staff - 员工
// ==========================================
// 对齐: staff 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub staff_id: String,
    pub name: String,
    pub email: Option<String>,
    pub department: String,
    pub position: Option<String>,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Staff {
    /// 当前身份戳
    pub fn stamp(&self) -> IdentityStamp {
        IdentityStamp {
            id: self.staff_id.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

// ==========================================
// IdentityStamp - 操作人身份戳
// ==========================================
// 操作发生时解析并固化 (id + 显示名 + 角色)
// 后续员工改名不影响历史记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityStamp {
    pub id: String,
    pub name: String,
    pub role: StaffRole,
}

impl IdentityStamp {
    pub fn has_role(&self, roles: &[StaffRole]) -> bool {
        roles.contains(&self.role)
    }
}
