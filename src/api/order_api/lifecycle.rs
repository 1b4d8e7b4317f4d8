use super::*;

use chrono::NaiveDate;

use crate::api::inventory_api::InventoryApi;
use crate::api::validator;
use crate::domain::order::{compute_total, NewOrder, OrderEdit, Payment};
use crate::domain::types::{OrderStatus, PaymentStatus};
use crate::engine::order_flow::{OrderAction, OrderFlow};
use crate::repository::item_repo::ItemRepository;

impl OrderApi {
    // ==========================================
    // 订单建立与编辑
    // ==========================================

    /// 新建采购订单
    ///
    /// # 参数
    /// - `input`: 物品 (id 或名称) + 供应商 (id 或名称) + 数量 + 单价
    ///
    /// # 返回
    /// - `Ok(Order)`: Pending 订单, total_cost = quantity × unit_price
    /// - `Err(InvalidInput)`: 参数不合法
    /// - `Err(NotFound)`: 指定的物品不存在
    pub fn create(&self, input: NewOrder) -> ApiResult<Order> {
        validator::validate_new_order(&input)?;

        let requested_by = match input.requester_id.as_deref() {
            Some(id) => Some(self.identity.resolve(id)?),
            None => None,
        };

        let order = self.uow.run(|tx| {
            let conn: &Connection = tx;

            // 指定物品ID时必须存在, 名称缺省时取物品名称
            let mut item_name = input.item_name.clone().filter(|n| !n.trim().is_empty());
            let item_id = input.item_id.clone().filter(|id| !id.trim().is_empty());
            if let Some(item_id) = item_id.as_deref() {
                let item = ItemRepository::find_by_id_in(conn, item_id)?.ok_or_else(|| {
                    ApiError::NotFound(format!("物品(id={})不存在", item_id))
                })?;
                if item_name.is_none() {
                    item_name = Some(item.name);
                }
            }

            let now = chrono::Utc::now().naive_utc();
            let order = Order {
                order_id: uuid::Uuid::new_v4().to_string(),
                item_id,
                item_name,
                supplier_id: input.supplier_id.clone().filter(|s| !s.trim().is_empty()),
                supplier_name: input.supplier_name.clone().filter(|s| !s.trim().is_empty()),
                quantity: input.quantity,
                unit_price: input.unit_price,
                total_cost: compute_total(input.quantity, input.unit_price),
                description: input.description.clone(),
                status: OrderStatus::Pending,
                requested_by: requested_by.clone(),
                order_date: now,
                estimated_delivery: input.estimated_delivery,
                delivery_date: None,
                tracking_number: None,
                rejection_reason: None,
                cancellation_reason: None,
                stock_credited: false,
                payment: Payment::default(),
                created_at: now,
                updated_at: now,
                revision: 1,
            };

            OrderRepository::insert_in(conn, &order)?;
            let mut log = ActionLog::new(EntityType::Order, &order.order_id, ActionType::CreateOrder)
                .with_payload(&json!({
                    "to": OrderStatus::Pending.to_db_str(),
                    "quantity": order.quantity,
                    "unit_price": order.unit_price,
                    "total_cost": order.total_cost,
                }));
            if let Some(stamp) = requested_by.as_ref() {
                log = log.by(stamp);
            }
            ActionLogRepository::insert_in(conn, &log)?;
            Ok::<_, ApiError>(order)
        })?;

        info!(
            order_id = %order.order_id,
            item = %order.item_label(),
            quantity = order.quantity,
            total_cost = order.total_cost,
            "采购订单已建立"
        );
        Ok(order)
    }

    /// 编辑订单
    ///
    /// # 规则
    /// - 数量/单价仅 Pending 可改, 修改后重算 total_cost
    /// - 终态 (Paid / Rejected / Cancelled) 不可编辑
    pub fn update_order(&self, order_id: &str, operator_id: &str, edit: OrderEdit) -> ApiResult<Order> {
        validator::validate_order_edit(&edit)?;
        let stamp = self.identity.resolve(operator_id)?;

        self.apply(order_id, ActionType::UpdateOrder, &stamp, |_, order, _| {
            if matches!(
                order.status,
                OrderStatus::Paid | OrderStatus::Rejected | OrderStatus::Cancelled
            ) {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "订单(id={})状态为{}, 不可编辑",
                    order.order_id, order.status
                )));
            }
            if edit.touches_cost() && !OrderFlow::can_edit_cost(order.status) {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "订单(id={})状态为{}, 数量与单价仅在 Pending 时可修改",
                    order.order_id, order.status
                )));
            }

            if let Some(quantity) = edit.quantity {
                order.quantity = quantity;
            }
            if let Some(unit_price) = edit.unit_price {
                order.unit_price = unit_price;
            }
            if let Some(description) = edit.description {
                order.description = Some(description);
            }
            if let Some(estimated_delivery) = edit.estimated_delivery {
                order.estimated_delivery = Some(estimated_delivery);
            }
            order.recompute_total();
            Ok(None)
        })
    }

    // ==========================================
    // 订单主流程
    // ==========================================

    /// Pending → Approved
    pub fn approve(&self, order_id: &str, operator_id: &str) -> ApiResult<Order> {
        let stamp = self.identity.resolve(operator_id)?;
        self.apply(order_id, ActionType::ApproveOrder, &stamp, |_, order, _| {
            order.status = OrderFlow::apply(order.status, OrderAction::Approve)?;
            Ok(None)
        })
    }

    /// Approved → Processing
    pub fn mark_processing(&self, order_id: &str, operator_id: &str) -> ApiResult<Order> {
        let stamp = self.identity.resolve(operator_id)?;
        self.apply(order_id, ActionType::ProcessOrder, &stamp, |_, order, _| {
            order.status = OrderFlow::apply(order.status, OrderAction::MarkProcessing)?;
            Ok(None)
        })
    }

    /// Processing → Delivered
    ///
    /// # 参数
    /// - `delivery_date`: 缺省为当天
    pub fn mark_delivered(
        &self,
        order_id: &str,
        operator_id: &str,
        tracking_number: Option<String>,
        delivery_date: Option<NaiveDate>,
    ) -> ApiResult<Order> {
        let stamp = self.identity.resolve(operator_id)?;
        self.apply(order_id, ActionType::DeliverOrder, &stamp, |_, order, now| {
            order.status = OrderFlow::apply(order.status, OrderAction::MarkDelivered)?;
            order.delivery_date = Some(delivery_date.unwrap_or_else(|| now.date()));
            if tracking_number.is_some() {
                order.tracking_number = tracking_number;
            }
            Ok(None)
        })
    }

    /// 入库: Delivered → Payment Pending, 付款状态置 Pending
    ///
    /// 订单引用物品ID时, 同一事务内按订单数量增加库存;
    /// 仅有自由文本物品名称时不动库存
    ///
    /// # 返回
    /// - `Err(NotFound)`: 引用的物品已不存在, 订单保持 Delivered
    pub fn mark_received(&self, order_id: &str, operator_id: &str) -> ApiResult<Order> {
        let stamp = self.identity.resolve(operator_id)?;
        self.apply(order_id, ActionType::ReceiveOrder, &stamp, |conn, order, now| {
            order.status = OrderFlow::apply(order.status, OrderAction::MarkReceived)?;
            order.payment.status = PaymentStatus::Pending;

            match order.item_id.clone() {
                Some(item_id) => {
                    let new_stock = InventoryApi::credit_in(
                        conn,
                        &item_id,
                        order.quantity,
                        now,
                        Some(&order.order_id),
                    )?;
                    order.stock_credited = true;
                    Ok(Some(format!(
                        "入库 {} x{}, 库存 {}",
                        item_id, order.quantity, new_stock
                    )))
                }
                None => Ok(Some(format!("自由文本物品 {}, 不入账", order.item_label()))),
            }
        })
    }

    /// 驳回: Pending / Approved / Processing → Rejected
    pub fn reject(&self, order_id: &str, operator_id: &str, reason: Option<&str>) -> ApiResult<Order> {
        let stamp = self.identity.resolve(operator_id)?;
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        self.apply(order_id, ActionType::RejectOrder, &stamp, |_, order, _| {
            order.status = OrderFlow::apply(order.status, OrderAction::Reject)?;
            order.rejection_reason = reason.clone();
            Ok(reason)
        })
    }

    /// 撤销
    ///
    /// # 规则
    /// - Paid → CannotCancelPaid
    /// - Cancelled / Rejected → InvalidTransition
    /// - 已入账库存在同一事务内冲回, 库存不足则整体失败
    /// - 付款记录置 Cancelled, 撤销原因追加到付款备注
    pub fn cancel(&self, order_id: &str, operator_id: &str, reason: Option<&str>) -> ApiResult<Order> {
        let stamp = self.identity.resolve(operator_id)?;
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        self.apply(order_id, ActionType::CancelOrder, &stamp, |conn, order, now| {
            if order.status == OrderStatus::Paid {
                return Err(ApiError::CannotCancelPaid(order.order_id.clone()));
            }
            order.status = OrderFlow::apply(order.status, OrderAction::Cancel)?;
            order.cancellation_reason = reason.clone();

            let note = format!("订单撤销: {}", reason.as_deref().unwrap_or("未填写原因"));
            let payment = &mut order.payment;
            payment.status = PaymentStatus::Cancelled;
            payment.notes = Some(match payment.notes.take() {
                Some(existing) if !existing.trim().is_empty() => format!("{}\n{}", existing, note),
                _ => note,
            });

            if order.stock_credited {
                if let Some(item_id) = order.item_id.clone() {
                    InventoryApi::debit_in(conn, &item_id, order.quantity, now, Some(&order.order_id))?;
                }
                order.stock_credited = false;
            }
            Ok(reason)
        })
    }

    /// 删除订单
    ///
    /// # 返回
    /// - `Err(BusinessRuleViolation)`: Approved / Delivered / Received / Paid 不可删除
    pub fn delete(&self, order_id: &str, operator_id: &str) -> ApiResult<()> {
        let stamp = self.identity.resolve(operator_id)?;

        self.uow.run(|tx| {
            let conn: &Connection = tx;
            let order = Self::load_in(conn, order_id)?;
            if !OrderFlow::can_delete(order.status) {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "订单(id={})状态为{}, 不可删除",
                    order.order_id, order.status
                )));
            }

            OrderRepository::delete_in(conn, &order.order_id, order.revision)?;
            ActionLogRepository::insert_in(
                conn,
                &ActionLog::new(EntityType::Order, &order.order_id, ActionType::DeleteOrder)
                    .by(&stamp)
                    .with_payload(&json!({
                        "from": order.status.to_db_str(),
                        "item": order.item_label(),
                        "total_cost": order.total_cost,
                    })),
            )?;

            info!(order_id = %order.order_id, status = %order.status, operator = %stamp.id, "订单已删除");
            Ok(())
        })
    }
}
