// ==========================================
// 剧院制作后台 - 状态迁移违规
// ==========================================

use std::fmt;
use thiserror::Error;

/// 非法状态迁移 (携带当前状态与目标状态)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("非法状态迁移: {from} → {to}")]
pub struct TransitionViolation {
    pub from: String,
    pub to: String,
}

impl TransitionViolation {
    pub fn new(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
