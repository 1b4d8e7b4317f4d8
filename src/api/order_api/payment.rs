use super::*;

use crate::api::identity::{require_role, FINANCE_ROLES};
use crate::domain::order::PaymentDetailsEdit;
use crate::domain::types::{PaymentStatus, StaffRole};
use crate::engine::order_flow::{OrderFlow, PaymentAction};

impl OrderApi {
    // ==========================================
    // 付款子流程
    // ==========================================
    // Payment Pending --提交--> Received/Submitted --审批--> Approved --处理--> Paid
    //                                   └--驳回--> Rejected
    // Paid --供应商确认--> Confirmed
    // ==========================================

    /// 提交付款
    ///
    /// # 参数
    /// - `method`: 缺省取配置 order.default_payment_method
    ///
    /// # 返回
    /// - `Ok(Order)`: 订单 Received, 付款 Submitted, amount_paid 默认为 total_cost
    /// - `Err(InvalidTransition)`: 订单不在 Payment Pending
    pub fn submit_payment(
        &self,
        order_id: &str,
        submitter_id: &str,
        method: Option<PaymentMethod>,
        transaction_id: Option<String>,
        notes: Option<String>,
    ) -> ApiResult<Order> {
        let stamp = self.identity.resolve(submitter_id)?;
        let method = match method {
            Some(m) => m,
            None => self.workflow_config()?.default_payment_method,
        };

        self.apply(order_id, ActionType::SubmitPayment, &stamp, |_, order, now| {
            let next = OrderFlow::apply_payment(order, PaymentAction::Submit)?;
            order.status = next.order_status;

            let payment = &mut order.payment;
            payment.status = next.payment_status;
            payment.method = Some(method);
            if transaction_id.is_some() {
                payment.transaction_id = transaction_id;
            }
            if notes.is_some() {
                payment.notes = notes;
            }
            payment.amount_paid = Some(order.total_cost);
            payment.submitted_by = Some(stamp.clone());
            payment.submitted_at = Some(now);
            Ok(Some(format!("付款方式 {}", method)))
        })
    }

    /// 审批付款: Submitted → Approved (需财务或行政角色)
    pub fn approve_payment(&self, order_id: &str, approver_id: &str) -> ApiResult<Order> {
        let stamp = self.identity.resolve(approver_id)?;
        require_role(&stamp, &FINANCE_ROLES, "审批付款")?;

        self.apply(order_id, ActionType::ApprovePayment, &stamp, |_, order, now| {
            let next = OrderFlow::apply_payment(order, PaymentAction::Approve)?;
            order.status = next.order_status;
            order.payment.status = next.payment_status;
            order.payment.approved_by = Some(stamp.clone());
            order.payment.approved_at = Some(now);
            Ok(None)
        })
    }

    /// 处理付款: Submitted / Approved → Paid (需财务或行政角色)
    ///
    /// # 规则
    /// - 先校验输入, 再校验状态
    /// - 非现金付款必须有交易号
    /// - 付款金额 (参数 > 已登记金额 > total_cost) 必须大于0
    pub fn process_payment(
        &self,
        order_id: &str,
        processor_id: &str,
        method: Option<PaymentMethod>,
        transaction_id: Option<String>,
        amount_paid: Option<f64>,
        notes: Option<String>,
    ) -> ApiResult<Order> {
        let stamp = self.identity.resolve(processor_id)?;
        require_role(&stamp, &FINANCE_ROLES, "处理付款")?;
        let default_method = self.workflow_config()?.default_payment_method;

        self.apply(order_id, ActionType::ProcessPayment, &stamp, |_, order, now| {
            let method = method.or(order.payment.method).unwrap_or(default_method);
            let transaction_id = transaction_id
                .filter(|t| !t.trim().is_empty())
                .or_else(|| order.payment.transaction_id.clone());
            if method.requires_transaction_id() && transaction_id.is_none() {
                return Err(ApiError::InvalidInput(format!(
                    "付款方式 {} 必须提供交易号",
                    method
                )));
            }

            let amount = amount_paid
                .or(order.payment.amount_paid)
                .unwrap_or(order.total_cost);
            if !(amount > 0.0) || !amount.is_finite() {
                return Err(ApiError::InvalidInput(format!("付款金额必须大于0, 实际为{}", amount)));
            }

            let next = OrderFlow::apply_payment(order, PaymentAction::Process)?;
            order.status = next.order_status;

            let payment = &mut order.payment;
            payment.status = next.payment_status;
            payment.method = Some(method);
            payment.transaction_id = transaction_id;
            payment.amount_paid = Some(amount);
            payment.payment_date = Some(now);
            if notes.is_some() {
                payment.notes = notes;
            }
            payment.processed_by = Some(stamp.clone());
            payment.processed_at = Some(now);
            Ok(Some(format!("{} {:.2}", method, amount)))
        })
    }

    /// 驳回付款: Submitted → Rejected, 订单保持 Received (需财务或行政角色)
    ///
    /// 驳回原因必填, 同时写入付款记录与审计日志
    pub fn reject_payment(&self, order_id: &str, approver_id: &str, reason: &str) -> ApiResult<Order> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApiError::InvalidInput("驳回付款必须填写原因".to_string()));
        }
        let stamp = self.identity.resolve(approver_id)?;
        require_role(&stamp, &FINANCE_ROLES, "驳回付款")?;

        self.apply(order_id, ActionType::RejectPayment, &stamp, |_, order, now| {
            let next = OrderFlow::apply_payment(order, PaymentAction::Reject)?;
            order.status = next.order_status;
            order.payment.status = next.payment_status;
            order.payment.rejected_by = Some(stamp.clone());
            order.payment.rejected_at = Some(now);
            order.payment.rejection_reason = Some(reason.to_string());
            Ok(Some(reason.to_string()))
        })
    }

    /// 供应商确认收款: Paid → Confirmed
    ///
    /// # 规则
    /// - 订单引用供应商ID时, 仅该供应商或行政可确认; 否则需供应商或行政角色
    /// - 已确认 → AlreadyConfirmed; 付款非 Paid → NotYetPaid
    pub fn confirm_supplier_receipt(
        &self,
        order_id: &str,
        confirmer_id: &str,
        proof: Option<String>,
        notes: Option<String>,
    ) -> ApiResult<Order> {
        let stamp = self.identity.resolve(confirmer_id)?;

        self.apply(order_id, ActionType::ConfirmSupplierReceipt, &stamp, |_, order, now| {
            let is_admin = stamp.role == StaffRole::Administration;
            let authorized = match order.supplier_id.as_deref() {
                Some(supplier_id) => is_admin || stamp.id == supplier_id,
                None => is_admin || stamp.role == StaffRole::Supplier,
            };
            if !authorized {
                return Err(ApiError::Unauthorized(format!(
                    "员工 {} 不是订单(id={})的供应商",
                    stamp.id, order.order_id
                )));
            }

            if order.payment.supplier_confirmation
                || order.payment.status == PaymentStatus::Confirmed
            {
                return Err(ApiError::AlreadyConfirmed(order.order_id.clone()));
            }
            if order.payment.status != PaymentStatus::Paid {
                return Err(ApiError::NotYetPaid {
                    order_id: order.order_id.clone(),
                    payment_status: order.payment.status.to_string(),
                });
            }

            let next = OrderFlow::apply_payment(order, PaymentAction::Confirm)?;
            order.status = next.order_status;

            let payment = &mut order.payment;
            payment.status = next.payment_status;
            payment.supplier_confirmation = true;
            payment.confirmed_by = Some(stamp.clone());
            payment.confirmation_date = Some(now);
            payment.confirmation_proof = proof;
            payment.confirmation_notes = notes;
            Ok(None)
        })
    }

    /// 修正付款信息 (付款完成前)
    pub fn update_payment_details(
        &self,
        order_id: &str,
        operator_id: &str,
        edit: PaymentDetailsEdit,
    ) -> ApiResult<Order> {
        if let Some(amount) = edit.amount_paid {
            if !(amount > 0.0) || !amount.is_finite() {
                return Err(ApiError::InvalidInput(format!("付款金额必须大于0, 实际为{}", amount)));
            }
        }
        let stamp = self.identity.resolve(operator_id)?;

        self.apply(order_id, ActionType::UpdatePaymentDetails, &stamp, |_, order, _| {
            if !OrderFlow::can_update_payment_details(order) {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "订单(id={})付款状态为{}, 付款信息不可再修改",
                    order.order_id, order.payment.status
                )));
            }

            let payment = &mut order.payment;
            if let Some(method) = edit.method {
                payment.method = Some(method);
            }
            if edit.transaction_id.is_some() {
                payment.transaction_id = edit.transaction_id;
            }
            if edit.amount_paid.is_some() {
                payment.amount_paid = edit.amount_paid;
            }
            if edit.notes.is_some() {
                payment.notes = edit.notes;
            }
            Ok(None)
        })
    }
}
