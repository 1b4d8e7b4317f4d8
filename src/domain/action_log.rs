// ==========================================
// 剧院制作后台 - 操作日志领域模型
// ==========================================
// 红线: 所有工作流写入必须记录, 且与状态变更处于同一事务
// 用途: 结构化审计追踪 (替代追加式备注文本)
// ==========================================

use crate::domain::staff::IdentityStamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 对齐: action_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub action_type: String,
    pub action_ts: NaiveDateTime,

    // ===== 操作人 (操作时固化) =====
    pub actor_id: Option<String>,
    pub actor_name: Option<String>,

    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

// ==========================================
// EntityType - 被审计实体
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Item,
    MaterialRequest,
    Order,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Item => "Item",
            EntityType::MaterialRequest => "MaterialRequest",
            EntityType::Order => "Order",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Item" => Some(EntityType::Item),
            "MaterialRequest" => Some(EntityType::MaterialRequest),
            "Order" => Some(EntityType::Order),
            _ => None,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    // ===== 库存 =====
    CreateItem,
    StockCredit,
    StockDebit,
    StockSet,
    UpdateItem,
    DeactivateItem,
    // ===== 物料申领 =====
    SubmitRequest,
    ApproveRequest,
    ProcessRequest,
    PrepareRequest,
    CollectRequest,
    RejectRequest,
    // ===== 订单 =====
    CreateOrder,
    UpdateOrder,
    ApproveOrder,
    ProcessOrder,
    DeliverOrder,
    ReceiveOrder,
    RejectOrder,
    CancelOrder,
    DeleteOrder,
    // ===== 付款 =====
    SubmitPayment,
    ApprovePayment,
    ProcessPayment,
    RejectPayment,
    ConfirmSupplierReceipt,
    UpdatePaymentDetails,
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateItem => "CreateItem",
            ActionType::StockCredit => "StockCredit",
            ActionType::StockDebit => "StockDebit",
            ActionType::StockSet => "StockSet",
            ActionType::UpdateItem => "UpdateItem",
            ActionType::DeactivateItem => "DeactivateItem",
            ActionType::SubmitRequest => "SubmitRequest",
            ActionType::ApproveRequest => "ApproveRequest",
            ActionType::ProcessRequest => "ProcessRequest",
            ActionType::PrepareRequest => "PrepareRequest",
            ActionType::CollectRequest => "CollectRequest",
            ActionType::RejectRequest => "RejectRequest",
            ActionType::CreateOrder => "CreateOrder",
            ActionType::UpdateOrder => "UpdateOrder",
            ActionType::ApproveOrder => "ApproveOrder",
            ActionType::ProcessOrder => "ProcessOrder",
            ActionType::DeliverOrder => "DeliverOrder",
            ActionType::ReceiveOrder => "ReceiveOrder",
            ActionType::RejectOrder => "RejectOrder",
            ActionType::CancelOrder => "CancelOrder",
            ActionType::DeleteOrder => "DeleteOrder",
            ActionType::SubmitPayment => "SubmitPayment",
            ActionType::ApprovePayment => "ApprovePayment",
            ActionType::ProcessPayment => "ProcessPayment",
            ActionType::RejectPayment => "RejectPayment",
            ActionType::ConfirmSupplierReceipt => "ConfirmSupplierReceipt",
            ActionType::UpdatePaymentDetails => "UpdatePaymentDetails",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// ActionLog 辅助方法
// ==========================================
impl ActionLog {
    /// 创建新的操作日志
    ///
    /// # 参数
    /// - `entity_type`: 被审计实体类型
    /// - `entity_id`: 实体ID
    /// - `action_type`: 操作类型
    pub fn new(entity_type: EntityType, entity_id: &str, action_type: ActionType) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            entity_type,
            entity_id: entity_id.to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor_id: None,
            actor_name: None,
            payload_json: None,
            detail: None,
        }
    }

    /// 设置操作人 (身份戳)
    pub fn by(mut self, stamp: &IdentityStamp) -> Self {
        self.actor_id = Some(stamp.id.clone());
        self.actor_name = Some(stamp.name.clone());
        self
    }

    /// 设置操作人 (仅ID, 如演员)
    pub fn by_actor_id(mut self, actor_id: &str) -> Self {
        self.actor_id = Some(actor_id.to_string());
        self
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置详细描述
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 状态迁移负载
    pub fn with_transition(self, from: &str, to: &str) -> Self {
        self.with_payload(&serde_json::json!({ "from": from, "to": to }))
    }

    /// 迁移负载中的目标状态
    pub fn target_status(&self) -> Option<&str> {
        self.payload_json
            .as_ref()
            .and_then(|p| p.get("to"))
            .and_then(|v| v.as_str())
    }
}
