use super::core::OrderRepository;
use crate::domain::order::Order;
use crate::domain::types::{OrderStatus, PaymentStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{parse_json, parse_opt_date, parse_opt_json, parse_ts};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult, Row};

const ORDER_COLUMNS: &str = r#"
    order_id, item_id, item_name, supplier_id, supplier_name,
    quantity, unit_price, total_cost, description, status,
    requested_by_json, order_date, estimated_delivery, delivery_date, tracking_number,
    rejection_reason, cancellation_reason, stock_credited, payment_json,
    created_at, updated_at, revision
"#;

/// 按付款状态汇总
#[derive(Debug, Clone)]
pub struct PaymentStatusTotal {
    pub payment_status: PaymentStatus,
    pub count: i64,
    pub total_cost: f64,
}

impl OrderRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in(&conn, order_id)
    }

    pub fn find_by_id_in(conn: &Connection, order_id: &str) -> RepositoryResult<Option<Order>> {
        let sql = format!("SELECT {} FROM purchase_order WHERE order_id = ?1", ORDER_COLUMNS);
        let order = conn
            .query_row(&sql, params![order_id], map_row)
            .optional()?;
        Ok(order)
    }

    /// 按 (订单状态, 付款状态) 筛选, None 表示不限
    pub fn list_by_status(
        &self,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(s) = status {
            clauses.push("status = ?");
            values.push(Value::Text(s.to_db_str().to_string()));
        }
        if let Some(p) = payment_status {
            clauses.push("payment_status = ?");
            values.push(Value::Text(p.to_db_str().to_string()));
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM purchase_order {} ORDER BY order_date DESC",
            ORDER_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params_from_iter(values), map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(orders)
    }

    /// 供应商订单 (按 supplier_id 或 supplier_name 匹配)
    pub fn list_by_supplier(&self, supplier: &str) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM purchase_order WHERE supplier_id = ?1 OR supplier_name = ?1 ORDER BY order_date DESC",
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params![supplier], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(orders)
    }

    /// 最近有付款动作的订单 (按提交时间倒序)
    pub fn list_recent_payment_activity(&self, limit: i64) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM purchase_order
            WHERE payment_status IN ('Submitted', 'Approved', 'Paid', 'Confirmed', 'Rejected')
            ORDER BY payment_submitted_at DESC, updated_at DESC
            LIMIT ?1
            "#,
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params![limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(orders)
    }

    /// 已付款但供应商未确认
    pub fn list_awaiting_supplier_confirmation(
        &self,
        supplier: Option<&str>,
    ) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM purchase_order
            WHERE payment_status = 'Paid' AND supplier_confirmation = 0
              AND (?1 IS NULL OR supplier_id = ?1 OR supplier_name = ?1)
            ORDER BY updated_at DESC
            "#,
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params![supplier], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(orders)
    }

    /// 按付款状态汇总订单数与金额
    pub fn totals_by_payment_status(&self) -> RepositoryResult<Vec<PaymentStatusTotal>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT payment_status, COUNT(*), COALESCE(SUM(total_cost), 0)
            FROM purchase_order
            GROUP BY payment_status
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.into_iter()
            .map(|(status, count, total_cost)| {
                let payment_status = PaymentStatus::from_str(&status).ok_or_else(|| {
                    RepositoryError::FieldValueError {
                        field: "payment_status".to_string(),
                        message: format!("未知付款状态: {}", status),
                    }
                })?;
                Ok(PaymentStatusTotal {
                    payment_status,
                    count,
                    total_cost,
                })
            })
            .collect()
    }

    pub fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM purchase_order", [], |row| row.get(0))?;
        Ok(count)
    }
}

// ==========================================
// 辅助方法
// ==========================================

/// 将数据库行映射为 Order 实体
fn map_row(row: &Row) -> SqliteResult<Order> {
    let status_str: String = row.get(9)?;
    let status = OrderStatus::from_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            rusqlite::types::Type::Text,
            format!("未知订单状态: {}", status_str).into(),
        )
    })?;

    Ok(Order {
        order_id: row.get(0)?,
        item_id: row.get(1)?,
        item_name: row.get(2)?,
        supplier_id: row.get(3)?,
        supplier_name: row.get(4)?,
        quantity: row.get(5)?,
        unit_price: row.get(6)?,
        total_cost: row.get(7)?,
        description: row.get(8)?,
        status,
        requested_by: parse_opt_json(10, row.get(10)?)?,
        order_date: parse_ts(11, &row.get::<_, String>(11)?)?,
        estimated_delivery: parse_opt_date(12, row.get(12)?)?,
        delivery_date: parse_opt_date(13, row.get(13)?)?,
        tracking_number: row.get(14)?,
        rejection_reason: row.get(15)?,
        cancellation_reason: row.get(16)?,
        stock_credited: row.get(17)?,
        payment: parse_json(18, &row.get::<_, String>(18)?)?,
        created_at: parse_ts(19, &row.get::<_, String>(19)?)?,
        updated_at: parse_ts(20, &row.get::<_, String>(20)?)?,
        revision: row.get(21)?,
    })
}
