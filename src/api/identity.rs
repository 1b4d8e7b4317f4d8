// ==========================================
// 剧院制作后台 - 身份解析
// ==========================================
// 职责: 将调用方提供的员工ID解析为身份戳 (操作发生时固化)
// 不负责: 认证与会话
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::staff::IdentityStamp;
use crate::domain::types::StaffRole;
use crate::repository::staff_repo::StaffRepository;

/// 身份解析器
pub trait IdentityResolver: Send + Sync {
    /// 解析员工身份
    ///
    /// # 返回
    /// - `NotFound`: 员工不存在
    /// - `Unauthorized`: 员工已停用
    fn resolve(&self, staff_id: &str) -> ApiResult<IdentityStamp>;
}

impl IdentityResolver for StaffRepository {
    fn resolve(&self, staff_id: &str) -> ApiResult<IdentityStamp> {
        let staff = self
            .find_by_id(staff_id)?
            .ok_or_else(|| ApiError::NotFound(format!("员工(id={})不存在", staff_id)))?;

        if !staff.is_active {
            return Err(ApiError::Unauthorized(format!(
                "员工(id={})已停用",
                staff_id
            )));
        }
        Ok(staff.stamp())
    }
}

/// 角色门控
pub fn require_role(stamp: &IdentityStamp, roles: &[StaffRole], action: &str) -> ApiResult<()> {
    if stamp.has_role(roles) {
        return Ok(());
    }

    let allowed = roles
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("/");
    tracing::warn!(
        staff_id = %stamp.id,
        role = %stamp.role,
        action = action,
        "角色不满足, 拒绝操作"
    );
    Err(ApiError::Unauthorized(format!(
        "{}需要角色 {}, 当前员工 {} 角色为 {}",
        action, allowed, stamp.id, stamp.role
    )))
}

/// 财务审批类操作的角色
pub const FINANCE_ROLES: [StaffRole; 2] = [StaffRole::Finance, StaffRole::Administration];
