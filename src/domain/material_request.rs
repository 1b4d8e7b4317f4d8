// ==========================================
// 剧院制作后台 - 物料申领领域模型
// ==========================================
// 红线: 状态只沿 pending → approved → processing → prepared → collected 前进
//       rejected 仅可由 pending / approved 进入
// 权威存储: material_request 表 (剧目视图为按 play_id 的只读投影)
// ==========================================

use crate::domain::staff::IdentityStamp;
use crate::domain::types::MaterialRequestStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// MaterialLine - 物料明细行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub name: String,
    pub quantity: i64,
    pub unit: String,
}

impl MaterialLine {
    pub fn new(name: impl Into<String>, quantity: i64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }
}

// ==========================================
// MaterialRequest - 物料申领
// ==========================================
// 对齐: material_request 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRequest {
    // ===== 主键与关联 =====
    pub request_id: String,
    pub play_id: String,
    pub actor_id: String,

    // ===== 申领内容 =====
    pub materials: Vec<MaterialLine>,
    pub status: MaterialRequestStatus,
    pub notes: Option<String>,

    // ===== 各状态时间戳 =====
    pub requested_at: NaiveDateTime,
    pub approved_at: Option<NaiveDateTime>,
    pub processing_at: Option<NaiveDateTime>,
    pub prepared_at: Option<NaiveDateTime>,
    pub collected_at: Option<NaiveDateTime>,
    pub rejected_at: Option<NaiveDateTime>,

    // ===== 操作人 =====
    pub prepared_by: Option<IdentityStamp>,
    pub rejection_reason: Option<String>,

    // ===== 并发控制 =====
    pub updated_at: NaiveDateTime,
    pub revision: i32,
}

impl MaterialRequest {
    /// 进入目标状态并写入对应时间戳
    pub fn enter(&mut self, status: MaterialRequestStatus, now: NaiveDateTime) {
        self.status = status;
        self.updated_at = now;
        match status {
            MaterialRequestStatus::Pending => self.requested_at = now,
            MaterialRequestStatus::Approved => self.approved_at = Some(now),
            MaterialRequestStatus::Processing => self.processing_at = Some(now),
            MaterialRequestStatus::Prepared => self.prepared_at = Some(now),
            MaterialRequestStatus::Collected => self.collected_at = Some(now),
            MaterialRequestStatus::Rejected => self.rejected_at = Some(now),
        }
    }

    /// 申领物料总件数
    pub fn total_quantity(&self) -> i64 {
        self.materials.iter().map(|m| m.quantity).sum()
    }
}
