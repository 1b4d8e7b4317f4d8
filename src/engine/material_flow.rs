// ==========================================
// 剧院制作后台 - 物料申领状态机
// ==========================================
// 主路径: pending → approved → processing → prepared → collected
// 驳回:   pending / approved → rejected
// 可配置: prepare_from_approved=true 时允许 approved → prepared
// 红线: Engine 不拼 SQL, 不访问仓储
// ==========================================

use crate::domain::types::MaterialRequestStatus;
use crate::engine::transition::TransitionViolation;
use serde::{Deserialize, Serialize};

// ==========================================
// MaterialRequestAction - 申领操作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialRequestAction {
    Approve,
    MarkProcessing,
    Prepare,
    Collect,
    Reject,
}

impl MaterialRequestAction {
    /// 操作的目标状态
    pub fn target(&self) -> MaterialRequestStatus {
        match self {
            MaterialRequestAction::Approve => MaterialRequestStatus::Approved,
            MaterialRequestAction::MarkProcessing => MaterialRequestStatus::Processing,
            MaterialRequestAction::Prepare => MaterialRequestStatus::Prepared,
            MaterialRequestAction::Collect => MaterialRequestStatus::Collected,
            MaterialRequestAction::Reject => MaterialRequestStatus::Rejected,
        }
    }
}

// ==========================================
// MaterialRequestFlow - 迁移表
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialRequestFlow {
    prepare_from_approved: bool,
}

impl MaterialRequestFlow {
    /// # 参数
    /// - `prepare_from_approved`: 是否允许跳过 processing 直接备好
    pub fn new(prepare_from_approved: bool) -> Self {
        Self {
            prepare_from_approved,
        }
    }

    /// 判断 from 状态下是否允许执行 action
    pub fn is_allowed(&self, from: MaterialRequestStatus, action: MaterialRequestAction) -> bool {
        use MaterialRequestAction as A;
        use MaterialRequestStatus as S;

        match action {
            A::Approve => from == S::Pending,
            A::MarkProcessing => from == S::Approved,
            A::Prepare => {
                from == S::Processing || (self.prepare_from_approved && from == S::Approved)
            }
            A::Collect => from == S::Prepared,
            A::Reject => matches!(from, S::Pending | S::Approved),
        }
    }

    /// 计算迁移后的状态
    ///
    /// # 返回
    /// - `Ok(target)`: 合法迁移
    /// - `Err(TransitionViolation)`: 携带当前状态与目标状态
    pub fn apply(
        &self,
        from: MaterialRequestStatus,
        action: MaterialRequestAction,
    ) -> Result<MaterialRequestStatus, TransitionViolation> {
        let target = action.target();
        if self.is_allowed(from, action) {
            Ok(target)
        } else {
            Err(TransitionViolation::new(from, target))
        }
    }

    /// 校验状态历史是否为合法路径 (首个状态必须为 pending)
    pub fn is_legal_history(&self, history: &[MaterialRequestStatus]) -> bool {
        let mut iter = history.iter();
        match iter.next() {
            Some(MaterialRequestStatus::Pending) => {}
            Some(_) => return false,
            None => return true,
        }

        let mut current = MaterialRequestStatus::Pending;
        for next in iter {
            let legal = [
                MaterialRequestAction::Approve,
                MaterialRequestAction::MarkProcessing,
                MaterialRequestAction::Prepare,
                MaterialRequestAction::Collect,
                MaterialRequestAction::Reject,
            ]
            .iter()
            .any(|a| a.target() == *next && self.is_allowed(current, *a));

            if !legal {
                return false;
            }
            current = *next;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MaterialRequestAction as A;
    use MaterialRequestStatus as S;

    #[test]
    fn test_strict_flow_happy_path() {
        let flow = MaterialRequestFlow::default();
        let mut status = S::Pending;
        for action in [A::Approve, A::MarkProcessing, A::Prepare, A::Collect] {
            status = flow.apply(status, action).unwrap();
        }
        assert_eq!(status, S::Collected);
    }

    #[test]
    fn test_prepare_from_approved_rejected_by_default() {
        let flow = MaterialRequestFlow::default();
        let err = flow.apply(S::Approved, A::Prepare).unwrap_err();
        assert_eq!(err.from, "approved");
        assert_eq!(err.to, "prepared");
    }

    #[test]
    fn test_prepare_from_approved_when_enabled() {
        let flow = MaterialRequestFlow::new(true);
        assert_eq!(flow.apply(S::Approved, A::Prepare).unwrap(), S::Prepared);
        assert_eq!(flow.apply(S::Processing, A::Prepare).unwrap(), S::Prepared);
        assert!(flow.apply(S::Pending, A::Prepare).is_err());
    }

    #[test]
    fn test_reject_only_from_pending_or_approved() {
        let flow = MaterialRequestFlow::default();
        assert!(flow.apply(S::Pending, A::Reject).is_ok());
        assert!(flow.apply(S::Approved, A::Reject).is_ok());
        for from in [S::Processing, S::Prepared, S::Collected, S::Rejected] {
            assert!(flow.apply(from, A::Reject).is_err(), "reject from {}", from);
        }
    }

    #[test]
    fn test_repeat_transition_is_violation() {
        let flow = MaterialRequestFlow::default();
        let err = flow.apply(S::Collected, A::Collect).unwrap_err();
        assert_eq!(err, TransitionViolation::new("collected", "collected"));
    }

    #[test]
    fn test_terminal_states_allow_nothing() {
        let flow = MaterialRequestFlow::new(true);
        for from in [S::Collected, S::Rejected] {
            for action in [A::Approve, A::MarkProcessing, A::Prepare, A::Collect, A::Reject] {
                assert!(!flow.is_allowed(from, action));
            }
        }
    }

    #[test]
    fn test_is_legal_history() {
        let flow = MaterialRequestFlow::default();
        assert!(flow.is_legal_history(&[S::Pending, S::Approved, S::Processing, S::Prepared, S::Collected]));
        assert!(flow.is_legal_history(&[S::Pending, S::Approved, S::Rejected]));
        assert!(!flow.is_legal_history(&[S::Pending, S::Processing]));
        assert!(!flow.is_legal_history(&[S::Pending, S::Approved, S::Processing, S::Rejected]));
        assert!(!flow.is_legal_history(&[S::Approved]));
        assert!(!flow.is_legal_history(&[S::Pending, S::Approved, S::Prepared]));
        assert!(MaterialRequestFlow::new(true).is_legal_history(&[S::Pending, S::Approved, S::Prepared]));
    }
}
