// ==========================================
// 剧院制作后台 - 采购订单领域模型
// ==========================================
// 红线: total_cost == quantity × unit_price (每次数量/单价变更后重算)
// 付款记录内嵌于订单, 无独立生命周期
// ==========================================

use crate::domain::staff::IdentityStamp;
use crate::domain::types::{OrderStatus, PaymentMethod, PaymentStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Payment - 付款记录 (内嵌)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub status: PaymentStatus,
    pub method: Option<PaymentMethod>,
    pub transaction_id: Option<String>,
    pub amount_paid: Option<f64>,
    pub payment_date: Option<NaiveDateTime>,
    pub notes: Option<String>,

    // ===== 流程签章 =====
    pub submitted_by: Option<IdentityStamp>,
    pub submitted_at: Option<NaiveDateTime>,
    pub approved_by: Option<IdentityStamp>,
    pub approved_at: Option<NaiveDateTime>,
    pub processed_by: Option<IdentityStamp>,
    pub processed_at: Option<NaiveDateTime>,
    pub rejected_by: Option<IdentityStamp>,
    pub rejected_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,

    // ===== 供应商确认 =====
    pub supplier_confirmation: bool,
    pub confirmed_by: Option<IdentityStamp>,
    pub confirmation_date: Option<NaiveDateTime>,
    pub confirmation_proof: Option<String>,
    pub confirmation_notes: Option<String>,
}

impl Default for Payment {
    fn default() -> Self {
        Self {
            status: PaymentStatus::Pending,
            method: None,
            transaction_id: None,
            amount_paid: None,
            payment_date: None,
            notes: None,
            submitted_by: None,
            submitted_at: None,
            approved_by: None,
            approved_at: None,
            processed_by: None,
            processed_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            supplier_confirmation: false,
            confirmed_by: None,
            confirmation_date: None,
            confirmation_proof: None,
            confirmation_notes: None,
        }
    }
}

// ==========================================
// Order - 采购订单
// ==========================================
// 对齐: purchase_order 表 (payment 以 JSON 存储, 状态列单独索引)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    // ===== 主键 =====
    pub order_id: String,

    // ===== 物品 (id 或自由文本名称) =====
    pub item_id: Option<String>,
    pub item_name: Option<String>,

    // ===== 供应商 (id 或自由文本名称) =====
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,

    // ===== 数量与金额 =====
    pub quantity: i64,
    pub unit_price: f64,
    pub total_cost: f64,
    pub description: Option<String>,

    // ===== 流程 =====
    pub status: OrderStatus,
    pub requested_by: Option<IdentityStamp>,
    pub order_date: NaiveDateTime,
    pub estimated_delivery: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub tracking_number: Option<String>,
    pub rejection_reason: Option<String>,
    pub cancellation_reason: Option<String>,

    // ===== 库存联动 =====
    pub stock_credited: bool, // 入库时已增加库存 (撤销时需冲回)

    // ===== 付款 =====
    pub payment: Payment,

    // ===== 审计与并发 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub revision: i32,
}

impl Order {
    /// 重算总价
    pub fn recompute_total(&mut self) {
        self.total_cost = compute_total(self.quantity, self.unit_price);
    }

    /// 显示名称 (物品名优先)
    pub fn item_label(&self) -> &str {
        self.item_name
            .as_deref()
            .or(self.item_id.as_deref())
            .unwrap_or("")
    }

    /// 已付款且等待供应商确认
    pub fn awaiting_supplier_confirmation(&self) -> bool {
        self.payment.status == PaymentStatus::Paid && !self.payment.supplier_confirmation
    }
}

/// total_cost = quantity × unit_price
pub fn compute_total(quantity: i64, unit_price: f64) -> f64 {
    quantity as f64 * unit_price
}

// ==========================================
// NewOrder - 新建订单参数
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrder {
    pub item_id: Option<String>,
    pub item_name: Option<String>,
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,
    pub quantity: i64,
    pub unit_price: f64,
    pub description: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    pub requester_id: Option<String>,
}

// ==========================================
// OrderEdit - 订单编辑参数 (None 表示不修改)
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderEdit {
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
    pub description: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
}

impl OrderEdit {
    pub fn touches_cost(&self) -> bool {
        self.quantity.is_some() || self.unit_price.is_some()
    }
}

// ==========================================
// PaymentDetailsEdit - 付款信息修正 (None 表示不修改)
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentDetailsEdit {
    pub method: Option<PaymentMethod>,
    pub transaction_id: Option<String>,
    pub amount_paid: Option<f64>,
    pub notes: Option<String>,
}
