// ==========================================
// 剧院制作后台 - 库存物品领域模型
// ==========================================
// 红线: current_stock 永不为负
// 生命周期: 采购建档创建; 仅由订单入库/撤销修改库存; 只软删除
// ==========================================

use crate::domain::types::ItemCategory;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 默认库存阈值（新建物品未指定时使用）
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;
pub const DEFAULT_MIN_STOCK_LEVEL: i64 = 5;
pub const DEFAULT_MAX_STOCK_LEVEL: i64 = 100;
pub const DEFAULT_REORDER_POINT: i64 = 20;
pub const DEFAULT_UNIT: &str = "pcs";

// ==========================================
// Item - 库存物品
// ==========================================
// 对齐: item 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    // ===== 主键 =====
    pub item_id: String,

    // ===== 基础信息 =====
    pub name: String,
    pub description: Option<String>,
    pub category: ItemCategory,
    pub unit: String,
    pub location: Option<String>,

    // ===== 库存 =====
    pub current_stock: i64,
    pub low_stock_threshold: i64,
    pub min_stock_level: i64,
    pub max_stock_level: i64,
    pub reorder_point: i64,

    // ===== 价格 =====
    pub unit_cost: f64,
    pub selling_price: f64,

    // ===== 供应商 =====
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,

    // ===== 状态 =====
    pub last_restocked: Option<NaiveDateTime>,
    pub is_active: bool,
    pub notes: Option<String>,

    // ===== 审计字段 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub revision: i32,
}

impl Item {
    /// 库存偏低: current_stock <= low_stock_threshold
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.low_stock_threshold
    }

    /// 库存告急: current_stock <= min_stock_level
    pub fn is_critical_stock(&self) -> bool {
        self.current_stock <= self.min_stock_level
    }

    /// 达到补货点
    pub fn needs_reorder(&self) -> bool {
        self.current_stock <= self.reorder_point
    }

    /// 库存货值
    pub fn stock_value(&self) -> f64 {
        self.current_stock as f64 * self.unit_cost
    }
}

// ==========================================
// NewItem - 新建物品参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub category: ItemCategory,
    pub initial_stock: i64,
    pub low_stock_threshold: i64,
    pub min_stock_level: i64,
    pub max_stock_level: i64,
    pub reorder_point: i64,
    pub unit: String,
    pub unit_cost: f64,
    pub selling_price: f64,
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl NewItem {
    /// 以默认阈值创建
    pub fn new(name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            name: name.into(),
            description: None,
            category,
            initial_stock: 0,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            min_stock_level: DEFAULT_MIN_STOCK_LEVEL,
            max_stock_level: DEFAULT_MAX_STOCK_LEVEL,
            reorder_point: DEFAULT_REORDER_POINT,
            unit: DEFAULT_UNIT.to_string(),
            unit_cost: 0.0,
            selling_price: 0.0,
            supplier_id: None,
            supplier_name: None,
            location: None,
            notes: None,
        }
    }

    pub fn with_stock(mut self, initial_stock: i64) -> Self {
        self.initial_stock = initial_stock;
        self
    }

    pub fn with_thresholds(mut self, low_stock_threshold: i64, min_stock_level: i64) -> Self {
        self.low_stock_threshold = low_stock_threshold;
        self.min_stock_level = min_stock_level;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: f64) -> Self {
        self.unit_cost = unit_cost;
        self
    }
}

// ==========================================
// ItemEdit - 物品资料修改 (None 表示不修改)
// ==========================================
// 不含 current_stock: 库存只经由入库/出库/盘点变动
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemEdit {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ItemCategory>,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub low_stock_threshold: Option<i64>,
    pub min_stock_level: Option<i64>,
    pub max_stock_level: Option<i64>,
    pub reorder_point: Option<i64>,
    pub unit_cost: Option<f64>,
    pub selling_price: Option<f64>,
    pub supplier_name: Option<String>,
    pub notes: Option<String>,
}

impl Item {
    /// 合并修改项
    pub fn apply_edit(&mut self, edit: ItemEdit) {
        if let Some(name) = edit.name {
            self.name = name.trim().to_string();
        }
        if let Some(unit) = edit.unit {
            self.unit = unit.trim().to_string();
        }
        if let Some(category) = edit.category {
            self.category = category;
        }
        if edit.description.is_some() {
            self.description = edit.description;
        }
        if edit.location.is_some() {
            self.location = edit.location;
        }
        if edit.supplier_name.is_some() {
            self.supplier_name = edit.supplier_name;
        }
        if edit.notes.is_some() {
            self.notes = edit.notes;
        }
        self.low_stock_threshold = edit.low_stock_threshold.unwrap_or(self.low_stock_threshold);
        self.min_stock_level = edit.min_stock_level.unwrap_or(self.min_stock_level);
        self.max_stock_level = edit.max_stock_level.unwrap_or(self.max_stock_level);
        self.reorder_point = edit.reorder_point.unwrap_or(self.reorder_point);
        self.unit_cost = edit.unit_cost.unwrap_or(self.unit_cost);
        self.selling_price = edit.selling_price.unwrap_or(self.selling_price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(current_stock: i64) -> Item {
        let now = chrono::Utc::now().naive_utc();
        Item {
            item_id: "item-1".to_string(),
            name: "Stage Lights".to_string(),
            description: None,
            category: ItemCategory::Equipment,
            unit: DEFAULT_UNIT.to_string(),
            location: None,
            current_stock,
            low_stock_threshold: 5,
            min_stock_level: 2,
            max_stock_level: 50,
            reorder_point: 8,
            unit_cost: 12.5,
            selling_price: 0.0,
            supplier_id: None,
            supplier_name: None,
            last_restocked: None,
            is_active: true,
            notes: None,
            created_at: now,
            updated_at: now,
            revision: 1,
        }
    }

    #[test]
    fn test_stock_flags_at_boundaries() {
        let item = sample_item(5);
        assert!(item.is_low_stock());
        assert!(!item.is_critical_stock());

        let item = sample_item(2);
        assert!(item.is_critical_stock());

        let item = sample_item(6);
        assert!(!item.is_low_stock());
        assert!(item.needs_reorder());
    }

    #[test]
    fn test_stock_value() {
        assert_eq!(sample_item(4).stock_value(), 50.0);
    }
}
