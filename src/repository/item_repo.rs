// ==========================================
// 剧院制作后台 - 库存物品数据仓储
// ==========================================
// 红线: 库存增减必须是单条条件 UPDATE (current_stock + delta >= 0)
//       不允许先读后写
// ==========================================

use crate::domain::item::Item;
use crate::domain::types::ItemCategory;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{fmt_ts, parse_opt_ts, parse_ts, revision_miss};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const ITEM_COLUMNS: &str = r#"
    item_id, name, description, category, unit, location,
    current_stock, low_stock_threshold, min_stock_level, max_stock_level, reorder_point,
    unit_cost, selling_price, supplier_id, supplier_name,
    last_restocked, is_active, notes, created_at, updated_at, revision
"#;

// ==========================================
// ItemRepository - 库存物品仓储
// ==========================================
pub struct ItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ItemRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 实例方法 (自行加锁)
    // ==========================================

    pub fn insert(&self, item: &Item) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_in(&conn, item)
    }

    pub fn find_by_id(&self, item_id: &str) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in(&conn, item_id)
    }

    pub fn list(&self, active_only: bool) -> RepositoryResult<Vec<Item>> {
        let conn = self.get_conn()?;
        Self::list_in(&conn, active_only)
    }

    /// 库存偏低 (current_stock <= low_stock_threshold) 的在用物品
    pub fn list_low_stock(&self) -> RepositoryResult<Vec<Item>> {
        let conn = self.get_conn()?;
        Self::query_items(
            &conn,
            "WHERE is_active = 1 AND current_stock <= low_stock_threshold ORDER BY current_stock ASC, name ASC",
        )
    }

    /// 库存告急 (current_stock <= min_stock_level) 的在用物品
    pub fn list_critical(&self) -> RepositoryResult<Vec<Item>> {
        let conn = self.get_conn()?;
        Self::query_items(
            &conn,
            "WHERE is_active = 1 AND current_stock <= min_stock_level ORDER BY current_stock ASC, name ASC",
        )
    }

    pub fn adjust_stock(&self, item_id: &str, delta: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::adjust_stock_in(&conn, item_id, delta, chrono::Utc::now().naive_utc())
    }

    // ==========================================
    // 事务内函数
    // ==========================================

    pub fn insert_in(conn: &Connection, item: &Item) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO item (
                item_id, name, description, category, unit, location,
                current_stock, low_stock_threshold, min_stock_level, max_stock_level, reorder_point,
                unit_cost, selling_price, supplier_id, supplier_name,
                last_restocked, is_active, notes, created_at, updated_at, revision
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
            "#,
            params![
                item.item_id,
                item.name,
                item.description,
                item.category.to_db_str(),
                item.unit,
                item.location,
                item.current_stock,
                item.low_stock_threshold,
                item.min_stock_level,
                item.max_stock_level,
                item.reorder_point,
                item.unit_cost,
                item.selling_price,
                item.supplier_id,
                item.supplier_name,
                item.last_restocked.as_ref().map(fmt_ts),
                item.is_active,
                item.notes,
                fmt_ts(&item.created_at),
                fmt_ts(&item.updated_at),
                item.revision,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id_in(conn: &Connection, item_id: &str) -> RepositoryResult<Option<Item>> {
        let sql = format!("SELECT {} FROM item WHERE item_id = ?1", ITEM_COLUMNS);
        let item = conn
            .query_row(&sql, params![item_id], Self::map_row)
            .optional()?;
        Ok(item)
    }

    pub fn list_in(conn: &Connection, active_only: bool) -> RepositoryResult<Vec<Item>> {
        if active_only {
            Self::query_items(conn, "WHERE is_active = 1 ORDER BY name ASC")
        } else {
            Self::query_items(conn, "ORDER BY name ASC")
        }
    }

    /// 原子增减库存
    ///
    /// # 参数
    /// - `delta`: 正数为入库 (同时写 last_restocked), 负数为出库
    ///
    /// # 返回
    /// - `Ok(new_stock)`: 调整后的库存
    /// - `Err(NotFound)`: 物品不存在
    /// - `Err(InsufficientStock)`: 调整后将为负, 未做任何修改
    pub fn adjust_stock_in(
        conn: &Connection,
        item_id: &str,
        delta: i64,
        now: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let now_str = fmt_ts(&now);
        let affected = conn.execute(
            r#"
            UPDATE item
            SET current_stock = current_stock + ?1,
                last_restocked = CASE WHEN ?1 > 0 THEN ?2 ELSE last_restocked END,
                updated_at = ?2,
                revision = revision + 1
            WHERE item_id = ?3
              AND current_stock + ?1 >= 0
            "#,
            params![delta, now_str, item_id],
        )?;

        let current: Option<i64> = conn
            .query_row(
                "SELECT current_stock FROM item WHERE item_id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .optional()?;

        match (affected, current) {
            (_, None) => Err(RepositoryError::not_found("Item", item_id)),
            (0, Some(available)) => Err(RepositoryError::InsufficientStock {
                item_id: item_id.to_string(),
                available,
                requested: -delta,
            }),
            (_, Some(new_stock)) => Ok(new_stock),
        }
    }

    /// 直接设置库存 (盘点校正)
    pub fn set_stock_in(
        conn: &Connection,
        item_id: &str,
        new_quantity: i64,
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let affected = conn.execute(
            r#"
            UPDATE item
            SET current_stock = ?1, updated_at = ?2, revision = revision + 1
            WHERE item_id = ?3
            "#,
            params![new_quantity, fmt_ts(&now), item_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Item", item_id));
        }
        Ok(())
    }

    /// 更新物品资料 (不含库存), 按 revision 条件写回
    ///
    /// # 返回
    /// - `Ok(new_revision)`
    /// - `Err(OptimisticLockFailure)`: revision 已变化 (含期间发生的库存变动)
    pub fn update_details_in(conn: &Connection, item: &Item) -> RepositoryResult<i32> {
        let affected = conn.execute(
            r#"
            UPDATE item
            SET name = ?1, description = ?2, category = ?3, unit = ?4, location = ?5,
                low_stock_threshold = ?6, min_stock_level = ?7, max_stock_level = ?8,
                reorder_point = ?9, unit_cost = ?10, selling_price = ?11,
                supplier_name = ?12, notes = ?13,
                updated_at = ?14, revision = revision + 1
            WHERE item_id = ?15 AND revision = ?16
            "#,
            params![
                item.name,
                item.description,
                item.category.to_db_str(),
                item.unit,
                item.location,
                item.low_stock_threshold,
                item.min_stock_level,
                item.max_stock_level,
                item.reorder_point,
                item.unit_cost,
                item.selling_price,
                item.supplier_name,
                item.notes,
                fmt_ts(&item.updated_at),
                item.item_id,
                item.revision,
            ],
        )?;

        if affected == 0 {
            return Err(revision_miss(conn, "item", "item_id", "Item", &item.item_id, item.revision));
        }
        Ok(item.revision + 1)
    }

    /// 软删除
    pub fn deactivate_in(conn: &Connection, item_id: &str, now: NaiveDateTime) -> RepositoryResult<()> {
        let affected = conn.execute(
            "UPDATE item SET is_active = 0, updated_at = ?1, revision = revision + 1 WHERE item_id = ?2",
            params![fmt_ts(&now), item_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Item", item_id));
        }
        Ok(())
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn query_items(conn: &Connection, tail: &str) -> RepositoryResult<Vec<Item>> {
        let sql = format!("SELECT {} FROM item {}", ITEM_COLUMNS, tail);
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(items)
    }

    fn map_row(row: &Row) -> SqliteResult<Item> {
        let category: String = row.get(3)?;
        Ok(Item {
            item_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category: ItemCategory::normalize_legacy(&category),
            unit: row.get(4)?,
            location: row.get(5)?,
            current_stock: row.get(6)?,
            low_stock_threshold: row.get(7)?,
            min_stock_level: row.get(8)?,
            max_stock_level: row.get(9)?,
            reorder_point: row.get(10)?,
            unit_cost: row.get(11)?,
            selling_price: row.get(12)?,
            supplier_id: row.get(13)?,
            supplier_name: row.get(14)?,
            last_restocked: parse_opt_ts(15, row.get(15)?)?,
            is_active: row.get(16)?,
            notes: row.get(17)?,
            created_at: parse_ts(18, &row.get::<_, String>(18)?)?,
            updated_at: parse_ts(19, &row.get::<_, String>(19)?)?,
            revision: row.get(20)?,
        })
    }
}
