// ==========================================
// 剧院制作后台 - 库存台账 API
// ==========================================
// 职责: 库存增减、盘点校正、物品建档与查询
// 红线: current_stock 永不为负; 增减为单条条件 UPDATE, 不做读后写
// 审计: 每次库存变动与审计日志同事务写入
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde_json::json;
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::action_log::{ActionLog, ActionType, EntityType};
use crate::domain::item::{Item, ItemEdit, NewItem};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::item_repo::ItemRepository;
use crate::repository::unit_of_work::UnitOfWork;

// ==========================================
// InventoryApi - 库存台账
// ==========================================
pub struct InventoryApi {
    item_repo: Arc<ItemRepository>,
    uow: Arc<UnitOfWork>,
}

impl InventoryApi {
    pub fn new(item_repo: Arc<ItemRepository>, uow: Arc<UnitOfWork>) -> Self {
        Self { item_repo, uow }
    }

    // ==========================================
    // 库存变动
    // ==========================================

    /// 入库
    ///
    /// # 参数
    /// - `item_id`: 物品ID
    /// - `quantity`: 入库数量 (>= 1)
    ///
    /// # 返回
    /// - `Ok(Item)`: 更新后的物品 (last_restocked 已刷新)
    /// - `Err(InvalidQuantity)`: 数量非法
    /// - `Err(NotFound)`: 物品不存在
    pub fn credit(&self, item_id: &str, quantity: i64) -> ApiResult<Item> {
        validator::validate_stock_quantity(quantity)?;

        self.uow.run(|tx| {
            let conn: &Connection = tx;
            let now = chrono::Utc::now().naive_utc();
            Self::credit_in(conn, item_id, quantity, now, None)?;
            Self::load_in(conn, item_id)
        })
    }

    /// 出库
    ///
    /// # 返回
    /// - `Err(InsufficientStock)`: 库存不足, 未做任何修改
    pub fn debit(&self, item_id: &str, quantity: i64) -> ApiResult<Item> {
        validator::validate_stock_quantity(quantity)?;

        self.uow.run(|tx| {
            let conn: &Connection = tx;
            let now = chrono::Utc::now().naive_utc();
            Self::debit_in(conn, item_id, quantity, now, None)?;
            Self::load_in(conn, item_id)
        })
    }

    /// 盘点校正: 直接设置库存
    pub fn set_exact(&self, item_id: &str, new_quantity: i64) -> ApiResult<Item> {
        if new_quantity < 0 {
            return Err(ApiError::InvalidQuantity(format!(
                "库存不能为负, 实际为{}",
                new_quantity
            )));
        }

        self.uow.run(|tx| {
            let conn: &Connection = tx;
            let now = chrono::Utc::now().naive_utc();
            let before = Self::load_in(conn, item_id)?;

            ItemRepository::set_stock_in(conn, item_id, new_quantity, now)?;
            ActionLogRepository::insert_in(
                conn,
                &ActionLog::new(EntityType::Item, item_id, ActionType::StockSet).with_payload(
                    &json!({ "before": before.current_stock, "after": new_quantity }),
                ),
            )?;

            info!(item_id = %item_id, before = before.current_stock, after = new_quantity, "库存盘点校正");
            Self::load_in(conn, item_id)
        })
    }

    // ==========================================
    // 事务内库存变动 (供订单工作流复用)
    // ==========================================

    /// 事务内入库并写审计
    ///
    /// # 参数
    /// - `source`: 触发来源 (如订单ID), 写入审计负载
    pub(crate) fn credit_in(
        conn: &Connection,
        item_id: &str,
        quantity: i64,
        now: NaiveDateTime,
        source: Option<&str>,
    ) -> ApiResult<i64> {
        let new_stock = ItemRepository::adjust_stock_in(conn, item_id, quantity, now)?;
        ActionLogRepository::insert_in(
            conn,
            &ActionLog::new(EntityType::Item, item_id, ActionType::StockCredit).with_payload(
                &json!({ "quantity": quantity, "after": new_stock, "source": source }),
            ),
        )?;
        debug!(item_id = %item_id, quantity, new_stock, "库存入账");
        Ok(new_stock)
    }

    /// 事务内出库并写审计
    pub(crate) fn debit_in(
        conn: &Connection,
        item_id: &str,
        quantity: i64,
        now: NaiveDateTime,
        source: Option<&str>,
    ) -> ApiResult<i64> {
        let new_stock = ItemRepository::adjust_stock_in(conn, item_id, -quantity, now)?;
        ActionLogRepository::insert_in(
            conn,
            &ActionLog::new(EntityType::Item, item_id, ActionType::StockDebit).with_payload(
                &json!({ "quantity": quantity, "after": new_stock, "source": source }),
            ),
        )?;
        debug!(item_id = %item_id, quantity, new_stock, "库存出账");
        Ok(new_stock)
    }

    // ==========================================
    // 物品建档
    // ==========================================

    /// 新建物品
    pub fn create_item(&self, input: NewItem) -> ApiResult<Item> {
        validator::validate_new_item(&input)?;

        let now = chrono::Utc::now().naive_utc();
        let item = Item {
            item_id: uuid::Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            category: input.category,
            unit: input.unit,
            location: input.location,
            current_stock: input.initial_stock,
            low_stock_threshold: input.low_stock_threshold,
            min_stock_level: input.min_stock_level,
            max_stock_level: input.max_stock_level,
            reorder_point: input.reorder_point,
            unit_cost: input.unit_cost,
            selling_price: input.selling_price,
            supplier_id: input.supplier_id,
            supplier_name: input.supplier_name,
            last_restocked: if input.initial_stock > 0 { Some(now) } else { None },
            is_active: true,
            notes: input.notes,
            created_at: now,
            updated_at: now,
            revision: 1,
        };

        self.uow.run(|tx| {
            let conn: &Connection = tx;
            ItemRepository::insert_in(conn, &item)?;
            ActionLogRepository::insert_in(
                conn,
                &ActionLog::new(EntityType::Item, &item.item_id, ActionType::CreateItem)
                    .with_payload(&json!({ "name": item.name, "initial_stock": item.current_stock })),
            )?;
            Ok::<_, ApiError>(())
        })?;

        info!(item_id = %item.item_id, name = %item.name, category = %item.category, "物品建档");
        Ok(item)
    }

    /// 修改物品资料
    ///
    /// 库存数量不在可修改范围内; 物品只可软删除
    ///
    /// # 返回
    /// - `Err(InvalidInput)`: 修改项不合法
    /// - `Err(NotFound)`: 物品不存在
    pub fn update_item(&self, item_id: &str, edit: ItemEdit) -> ApiResult<Item> {
        validator::validate_item_edit(&edit)?;

        self.uow.run(|tx| {
            let conn: &Connection = tx;
            let mut item = Self::load_in(conn, item_id)?;
            let before_name = item.name.clone();

            item.apply_edit(edit);
            item.updated_at = chrono::Utc::now().naive_utc();
            item.revision = ItemRepository::update_details_in(conn, &item)?;

            ActionLogRepository::insert_in(
                conn,
                &ActionLog::new(EntityType::Item, item_id, ActionType::UpdateItem).with_payload(
                    &json!({ "name_before": before_name, "name": item.name, "stock": item.current_stock }),
                ),
            )?;

            info!(item_id = %item_id, name = %item.name, "物品资料已修改");
            Ok(item)
        })
    }

    /// 软删除 (不可物理删除)
    pub fn deactivate_item(&self, item_id: &str) -> ApiResult<()> {
        self.uow.run(|tx| {
            let conn: &Connection = tx;
            ItemRepository::deactivate_in(conn, item_id, chrono::Utc::now().naive_utc())?;
            ActionLogRepository::insert_in(
                conn,
                &ActionLog::new(EntityType::Item, item_id, ActionType::DeactivateItem),
            )?;
            Ok(())
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_item(&self, item_id: &str) -> ApiResult<Item> {
        self.item_repo
            .find_by_id(item_id)?
            .ok_or_else(|| ApiError::NotFound(format!("物品(id={})不存在", item_id)))
    }

    pub fn list_items(&self, active_only: bool) -> ApiResult<Vec<Item>> {
        Ok(self.item_repo.list(active_only)?)
    }

    /// 库存偏低物品 (current_stock <= low_stock_threshold)
    pub fn list_low_stock_items(&self) -> ApiResult<Vec<Item>> {
        Ok(self.item_repo.list_low_stock()?)
    }

    /// 库存告急物品 (current_stock <= min_stock_level)
    pub fn list_critical_items(&self) -> ApiResult<Vec<Item>> {
        Ok(self.item_repo.list_critical()?)
    }

    fn load_in(conn: &Connection, item_id: &str) -> ApiResult<Item> {
        ItemRepository::find_by_id_in(conn, item_id)?
            .ok_or_else(|| ApiError::NotFound(format!("物品(id={})不存在", item_id)))
    }
}
