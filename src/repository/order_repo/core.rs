use crate::domain::order::Order;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{fmt_date, fmt_ts, revision_miss, to_opt_json};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// OrderRepository - 采购订单仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作 (事务内)
    // ==========================================

    pub fn insert_in(conn: &Connection, order: &Order) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO purchase_order (
                order_id, item_id, item_name, supplier_id, supplier_name,
                quantity, unit_price, total_cost, description, status,
                requested_by_json, order_date, estimated_delivery, delivery_date, tracking_number,
                rejection_reason, cancellation_reason, stock_credited,
                payment_status, supplier_confirmation, payment_submitted_at, payment_json,
                created_at, updated_at, revision
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25
            )
            "#,
            params![
                order.order_id,
                order.item_id,
                order.item_name,
                order.supplier_id,
                order.supplier_name,
                order.quantity,
                order.unit_price,
                order.total_cost,
                order.description,
                order.status.to_db_str(),
                to_opt_json(order.requested_by.as_ref())?,
                fmt_ts(&order.order_date),
                order.estimated_delivery.as_ref().map(fmt_date),
                order.delivery_date.as_ref().map(fmt_date),
                order.tracking_number,
                order.rejection_reason,
                order.cancellation_reason,
                order.stock_credited,
                order.payment.status.to_db_str(),
                order.payment.supplier_confirmation,
                order.payment.submitted_at.as_ref().map(fmt_ts),
                serde_json::to_string(&order.payment)?,
                fmt_ts(&order.created_at),
                fmt_ts(&order.updated_at),
                order.revision,
            ],
        )?;
        Ok(())
    }

    /// 以读取时的 revision 为条件写回整个订单
    ///
    /// # 返回
    /// - `Ok(new_revision)`
    /// - `Err(OptimisticLockFailure)` / `Err(NotFound)`
    pub fn update_in(conn: &Connection, order: &Order) -> RepositoryResult<i32> {
        let affected = conn.execute(
            r#"
            UPDATE purchase_order
            SET item_id = ?1, item_name = ?2, supplier_id = ?3, supplier_name = ?4,
                quantity = ?5, unit_price = ?6, total_cost = ?7, description = ?8, status = ?9,
                estimated_delivery = ?10, delivery_date = ?11, tracking_number = ?12,
                rejection_reason = ?13, cancellation_reason = ?14, stock_credited = ?15,
                payment_status = ?16, supplier_confirmation = ?17, payment_submitted_at = ?18,
                payment_json = ?19, updated_at = ?20, revision = revision + 1
            WHERE order_id = ?21 AND revision = ?22
            "#,
            params![
                order.item_id,
                order.item_name,
                order.supplier_id,
                order.supplier_name,
                order.quantity,
                order.unit_price,
                order.total_cost,
                order.description,
                order.status.to_db_str(),
                order.estimated_delivery.as_ref().map(fmt_date),
                order.delivery_date.as_ref().map(fmt_date),
                order.tracking_number,
                order.rejection_reason,
                order.cancellation_reason,
                order.stock_credited,
                order.payment.status.to_db_str(),
                order.payment.supplier_confirmation,
                order.payment.submitted_at.as_ref().map(fmt_ts),
                serde_json::to_string(&order.payment)?,
                fmt_ts(&order.updated_at),
                order.order_id,
                order.revision,
            ],
        )?;

        if affected == 0 {
            return Err(revision_miss(
                conn,
                "purchase_order",
                "order_id",
                "Order",
                &order.order_id,
                order.revision,
            ));
        }
        Ok(order.revision + 1)
    }

    /// 以 revision 为条件删除
    pub fn delete_in(conn: &Connection, order_id: &str, expected_revision: i32) -> RepositoryResult<()> {
        let affected = conn.execute(
            "DELETE FROM purchase_order WHERE order_id = ?1 AND revision = ?2",
            params![order_id, expected_revision],
        )?;
        if affected == 0 {
            return Err(revision_miss(
                conn,
                "purchase_order",
                "order_id",
                "Order",
                order_id,
                expected_revision,
            ));
        }
        Ok(())
    }
}
