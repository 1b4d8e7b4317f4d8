// ==========================================
// 剧院制作后台 - 订单与付款状态机
// ==========================================
// 订单: Pending → Approved → Processing → Delivered → (入库) Payment Pending
//       → (付款子流程) Paid
//       Rejected: Pending / Approved / Processing
//       Cancelled: 除 Paid 与终态外均可
// 付款: Pending → Submitted → Approved → Paid → Confirmed
//       Rejected: Submitted
//       付款审批/处理/驳回要求订单处于 Received
//       Cancelled: 随订单撤销
// 红线: Engine 不拼 SQL, 不访问仓储
// ==========================================

use crate::domain::order::Order;
use crate::domain::types::{OrderStatus, PaymentStatus};
use crate::engine::transition::TransitionViolation;
use serde::{Deserialize, Serialize};

// ==========================================
// OrderAction - 订单操作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderAction {
    Approve,
    MarkProcessing,
    MarkDelivered,
    MarkReceived,
    Reject,
    Cancel,
}

impl OrderAction {
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderAction::Approve => OrderStatus::Approved,
            OrderAction::MarkProcessing => OrderStatus::Processing,
            OrderAction::MarkDelivered => OrderStatus::Delivered,
            OrderAction::MarkReceived => OrderStatus::PaymentPending,
            OrderAction::Reject => OrderStatus::Rejected,
            OrderAction::Cancel => OrderStatus::Cancelled,
        }
    }
}

// ==========================================
// PaymentAction - 付款操作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentAction {
    Submit,
    Approve,
    Process,
    Reject,
    Confirm,
}

impl PaymentAction {
    pub fn target(&self) -> PaymentStatus {
        match self {
            PaymentAction::Submit => PaymentStatus::Submitted,
            PaymentAction::Approve => PaymentStatus::Approved,
            PaymentAction::Process => PaymentStatus::Paid,
            PaymentAction::Reject => PaymentStatus::Rejected,
            PaymentAction::Confirm => PaymentStatus::Confirmed,
        }
    }
}

/// 付款迁移结果: (订单新状态, 付款新状态)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentTransition {
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
}

// ==========================================
// OrderFlow - 迁移表
// ==========================================
pub struct OrderFlow;

impl OrderFlow {
    /// 订单状态迁移
    pub fn apply(from: OrderStatus, action: OrderAction) -> Result<OrderStatus, TransitionViolation> {
        use OrderStatus as S;

        let allowed = match action {
            OrderAction::Approve => from == S::Pending,
            OrderAction::MarkProcessing => from == S::Approved,
            OrderAction::MarkDelivered => from == S::Processing,
            OrderAction::MarkReceived => from == S::Delivered,
            OrderAction::Reject => matches!(from, S::Pending | S::Approved | S::Processing),
            OrderAction::Cancel => !matches!(from, S::Paid | S::Cancelled | S::Rejected),
        };

        let target = action.target();
        if allowed {
            Ok(target)
        } else {
            Err(TransitionViolation::new(from, target))
        }
    }

    /// 付款状态迁移 (受订单状态门控)
    ///
    /// # 返回
    /// - `Ok(PaymentTransition)`: 订单与付款的新状态
    /// - `Err(TransitionViolation)`: 付款状态或订单状态不满足
    pub fn apply_payment(
        order: &Order,
        action: PaymentAction,
    ) -> Result<PaymentTransition, TransitionViolation> {
        use OrderStatus as O;
        use PaymentStatus as P;

        let order_status = order.status;
        let payment_status = order.payment.status;
        let target = action.target();

        let next_order_status = match action {
            PaymentAction::Submit if order_status == O::PaymentPending => Some(O::Received),
            PaymentAction::Approve if order_status == O::Received && payment_status == P::Submitted => {
                Some(O::Received)
            }
            PaymentAction::Process
                if order_status == O::Received
                    && matches!(payment_status, P::Submitted | P::Approved) =>
            {
                Some(O::Paid)
            }
            PaymentAction::Reject if order_status == O::Received && payment_status == P::Submitted => {
                Some(O::Received)
            }
            PaymentAction::Confirm if order_status == O::Paid && payment_status == P::Paid => {
                Some(O::Paid)
            }
            _ => None,
        };

        match next_order_status {
            Some(order_status) => Ok(PaymentTransition {
                order_status,
                payment_status: target,
            }),
            None if action == PaymentAction::Submit => {
                Err(TransitionViolation::new(order_status, O::Received))
            }
            None => Err(TransitionViolation::new(payment_status, target)),
        }
    }

    /// 数量/单价仅在 Pending 时可改
    pub fn can_edit_cost(status: OrderStatus) -> bool {
        status == OrderStatus::Pending
    }

    /// 删除门控
    pub fn can_delete(status: OrderStatus) -> bool {
        !status.forbids_deletion()
    }

    /// 付款信息修正门控 (已付款或已撤销后不可改)
    pub fn can_update_payment_details(order: &Order) -> bool {
        !order.payment.status.is_closed()
            && !matches!(order.status, OrderStatus::Paid | OrderStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::Payment;
    use OrderStatus as O;
    use PaymentStatus as P;

    fn order_in(status: OrderStatus, payment_status: PaymentStatus) -> Order {
        let now = chrono::Utc::now().naive_utc();
        Order {
            order_id: "o1".to_string(),
            item_id: None,
            item_name: Some("Rope".to_string()),
            supplier_id: None,
            supplier_name: Some("Acme".to_string()),
            quantity: 1,
            unit_price: 1.0,
            total_cost: 1.0,
            description: None,
            status,
            requested_by: None,
            order_date: now,
            estimated_delivery: None,
            delivery_date: None,
            tracking_number: None,
            rejection_reason: None,
            cancellation_reason: None,
            stock_credited: false,
            payment: Payment {
                status: payment_status,
                ..Payment::default()
            },
            created_at: now,
            updated_at: now,
            revision: 1,
        }
    }

    #[test]
    fn test_order_happy_path() {
        let mut status = O::Pending;
        for action in [
            OrderAction::Approve,
            OrderAction::MarkProcessing,
            OrderAction::MarkDelivered,
            OrderAction::MarkReceived,
        ] {
            status = OrderFlow::apply(status, action).unwrap();
        }
        assert_eq!(status, O::PaymentPending);
    }

    #[test]
    fn test_order_steps_cannot_be_skipped() {
        let err = OrderFlow::apply(O::Approved, OrderAction::MarkDelivered).unwrap_err();
        assert_eq!(err.from, "Approved");
        assert_eq!(err.to, "Delivered");
        assert!(OrderFlow::apply(O::Pending, OrderAction::MarkReceived).is_err());
    }

    #[test]
    fn test_reject_and_cancel_sources() {
        assert!(OrderFlow::apply(O::Processing, OrderAction::Reject).is_ok());
        assert!(OrderFlow::apply(O::Delivered, OrderAction::Reject).is_err());

        for from in [O::Pending, O::Delivered, O::Received, O::PaymentPending] {
            assert_eq!(OrderFlow::apply(from, OrderAction::Cancel).unwrap(), O::Cancelled);
        }
        for from in [O::Paid, O::Cancelled, O::Rejected] {
            assert!(OrderFlow::apply(from, OrderAction::Cancel).is_err());
        }
    }

    #[test]
    fn test_payment_sub_flow() {
        let submitted = OrderFlow::apply_payment(&order_in(O::PaymentPending, P::Pending), PaymentAction::Submit).unwrap();
        assert_eq!(submitted.order_status, O::Received);
        assert_eq!(submitted.payment_status, P::Submitted);

        let approved = OrderFlow::apply_payment(&order_in(O::Received, P::Submitted), PaymentAction::Approve).unwrap();
        assert_eq!(approved.payment_status, P::Approved);

        let paid = OrderFlow::apply_payment(&order_in(O::Received, P::Approved), PaymentAction::Process).unwrap();
        assert_eq!(paid.order_status, O::Paid);

        // 直接从 Submitted 处理付款
        assert!(OrderFlow::apply_payment(&order_in(O::Received, P::Submitted), PaymentAction::Process).is_ok());

        let confirmed = OrderFlow::apply_payment(&order_in(O::Paid, P::Paid), PaymentAction::Confirm).unwrap();
        assert_eq!(confirmed.payment_status, P::Confirmed);
    }

    #[test]
    fn test_payment_gated_by_order_status() {
        // 订单已撤销: 付款审批不可继续
        let err = OrderFlow::apply_payment(&order_in(O::Cancelled, P::Submitted), PaymentAction::Approve).unwrap_err();
        assert_eq!(err.from, "Submitted");
        assert_eq!(err.to, "Approved");

        let err = OrderFlow::apply_payment(&order_in(O::Delivered, P::Pending), PaymentAction::Submit).unwrap_err();
        assert_eq!(err.from, "Delivered");
        assert_eq!(err.to, "Received");

        assert!(OrderFlow::apply_payment(&order_in(O::Received, P::Approved), PaymentAction::Reject).is_err());
    }

    #[test]
    fn test_edit_and_delete_guards() {
        assert!(OrderFlow::can_edit_cost(O::Pending));
        assert!(!OrderFlow::can_edit_cost(O::Approved));
        assert!(OrderFlow::can_delete(O::Pending));
        assert!(OrderFlow::can_delete(O::Cancelled));
        assert!(!OrderFlow::can_delete(O::Received));
        assert!(!OrderFlow::can_update_payment_details(&order_in(O::Paid, P::Paid)));
        assert!(OrderFlow::can_update_payment_details(&order_in(O::Received, P::Submitted)));
        assert!(!OrderFlow::can_update_payment_details(&order_in(O::Cancelled, P::Cancelled)));
    }
}
