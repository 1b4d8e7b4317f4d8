// ==========================================
// 剧院制作后台 - 采购订单与付款工作流 API
// ==========================================
// 职责: 订单建立、审批、发货、入库、付款子流程、供应商确认、撤销与删除
// 红线:
// - total_cost == quantity × unit_price
// - 入库 (库存增加) 与订单状态写入同事务, 全成或全不成
// - 已付款订单不可撤销
// 身份: 特权操作按员工ID解析身份戳 (操作时固化)
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::identity::IdentityResolver;
use crate::config::{ConfigManager, WorkflowConfig};
use crate::domain::action_log::{ActionLog, ActionType, EntityType};
use crate::domain::order::Order;
use crate::domain::staff::IdentityStamp;
use crate::domain::types::PaymentMethod;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::order_repo::OrderRepository;
use crate::repository::unit_of_work::UnitOfWork;

mod lifecycle;
mod payment;
mod queries;


// ==========================================
// OrderApi - 采购订单 API
// ==========================================
pub struct OrderApi {
    order_repo: Arc<OrderRepository>,
    identity: Arc<dyn IdentityResolver>,
    config: Arc<ConfigManager>,
    uow: Arc<UnitOfWork>,
}

impl OrderApi {
    pub fn new(
        order_repo: Arc<OrderRepository>,
        identity: Arc<dyn IdentityResolver>,
        config: Arc<ConfigManager>,
        uow: Arc<UnitOfWork>,
    ) -> Self {
        Self {
            order_repo,
            identity,
            config,
            uow,
        }
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn load_in(conn: &Connection, order_id: &str) -> ApiResult<Order> {
        OrderRepository::find_by_id_in(conn, order_id)?
            .ok_or_else(|| ApiError::NotFound(format!("订单(id={})不存在", order_id)))
    }

    /// 本次操作使用的配置快照
    fn workflow_config(&self) -> ApiResult<WorkflowConfig> {
        self.config
            .load_workflow_config()
            .map_err(ApiError::config_read)
    }

    /// 在单个事务内执行订单变更
    ///
    /// 顺序: 读取 → f (校验/迁移/耦合写入) → 条件写回 → 审计
    ///
    /// # 参数
    /// - `f`: 修改订单, 可返回写入审计的说明文字
    ///
    /// # 返回
    /// - `Ok(Order)`: 写回后的订单 (revision 已更新)
    fn apply<F>(
        &self,
        order_id: &str,
        action_type: ActionType,
        stamp: &IdentityStamp,
        f: F,
    ) -> ApiResult<Order>
    where
        F: FnOnce(&Connection, &mut Order, NaiveDateTime) -> ApiResult<Option<String>>,
    {
        self.uow.run(|tx| {
            let conn: &Connection = tx;
            let mut order = Self::load_in(conn, order_id)?;
            let from = order.status;
            let payment_from = order.payment.status;
            let now = chrono::Utc::now().naive_utc();

            let detail = f(conn, &mut order, now)?;

            order.updated_at = now;
            order.revision = OrderRepository::update_in(conn, &order)?;

            let mut log = ActionLog::new(EntityType::Order, &order.order_id, action_type)
                .by(stamp)
                .with_payload(&json!({
                    "from": from.to_db_str(),
                    "to": order.status.to_db_str(),
                    "payment_from": payment_from.to_db_str(),
                    "payment_to": order.payment.status.to_db_str(),
                }));
            if let Some(detail) = detail {
                log = log.with_detail(detail);
            }
            ActionLogRepository::insert_in(conn, &log)?;

            info!(
                order_id = %order.order_id,
                action = %action_type,
                from = %from,
                to = %order.status,
                payment_from = %payment_from,
                payment_to = %order.payment.status,
                operator = %stamp.id,
                "订单状态迁移"
            );
            Ok(order)
        })
    }
}
