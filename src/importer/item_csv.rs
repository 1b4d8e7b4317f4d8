// ==========================================
// 剧院制作后台 - 物品台账 CSV 导入
// ==========================================
// 职责: 读取物品台账 CSV, 逐行建档
// 规则:
// - 表头大小写不敏感, 前后空白忽略
// - 类别按旧数据规则归一 (tools → Equipment, 未知 → Other)
// - 单行失败不影响其他行, 汇总到 ImportReport
// ==========================================

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::inventory_api::InventoryApi;
use crate::domain::item::{
    NewItem, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_MAX_STOCK_LEVEL, DEFAULT_MIN_STOCK_LEVEL,
    DEFAULT_REORDER_POINT, DEFAULT_UNIT,
};
use crate::domain::types::ItemCategory;
use crate::importer::error::{ImportError, ImportResult};

// ==========================================
// CSV 行结构
// ==========================================
#[derive(Debug, Clone, Deserialize)]
struct ItemCsvRow {
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    current_stock: Option<i64>,
    #[serde(default)]
    low_stock_threshold: Option<i64>,
    #[serde(default)]
    min_stock_level: Option<i64>,
    #[serde(default)]
    max_stock_level: Option<i64>,
    #[serde(default)]
    reorder_point: Option<i64>,
    #[serde(default)]
    unit_cost: Option<f64>,
    #[serde(default)]
    selling_price: Option<f64>,
    #[serde(default)]
    supplier_name: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ItemCsvRow {
    fn into_new_item(self) -> NewItem {
        let category = self
            .category
            .as_deref()
            .map(ItemCategory::normalize_legacy)
            .unwrap_or(ItemCategory::Other);

        NewItem {
            name: self.name,
            description: non_empty(self.description),
            category,
            initial_stock: self.current_stock.unwrap_or(0),
            low_stock_threshold: self.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            min_stock_level: self.min_stock_level.unwrap_or(DEFAULT_MIN_STOCK_LEVEL),
            max_stock_level: self.max_stock_level.unwrap_or(DEFAULT_MAX_STOCK_LEVEL),
            reorder_point: self.reorder_point.unwrap_or(DEFAULT_REORDER_POINT),
            unit: non_empty(self.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            unit_cost: self.unit_cost.unwrap_or(0.0),
            selling_price: self.selling_price.unwrap_or(0.0),
            supplier_id: None,
            supplier_name: non_empty(self.supplier_name),
            location: non_empty(self.location),
            notes: None,
        }
    }
}

// ==========================================
// 导入结果
// ==========================================

/// 单行失败
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFailure {
    pub row: usize, // 数据行号 (从 1 开始, 不含表头)
    pub reason: String,
}

/// 导入汇总
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported_ids: Vec<String>,
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.imported_ids.len()
    }
}

// ==========================================
// ItemCsvImporter
// ==========================================
pub struct ItemCsvImporter {
    inventory: Arc<InventoryApi>,
}

impl ItemCsvImporter {
    pub fn new(inventory: Arc<InventoryApi>) -> Self {
        Self { inventory }
    }

    /// 从文件导入
    ///
    /// # 返回
    /// - `Err(FileNotFound)` / `Err(UnsupportedFormat)`: 文件级错误, 未导入任何行
    /// - `Ok(ImportReport)`: 逐行结果
    pub fn import_file(&self, path: &Path) -> ImportResult<ImportReport> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        let report = self.import_reader(file)?;
        info!(
            path = %path.display(),
            imported = report.imported(),
            failed = report.failures.len(),
            "物品台账导入完成"
        );
        Ok(report)
    }

    /// 从任意输入流导入
    pub fn import_reader<R: Read>(&self, reader: R) -> ImportResult<ImportReport> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        // 表头统一小写
        let headers = reader.headers()?.clone();
        let normalized: csv::StringRecord =
            headers.iter().map(|h| h.to_lowercase()).collect();
        reader.set_headers(normalized);

        let mut report = ImportReport::default();
        for (idx, result) in reader.deserialize::<ItemCsvRow>().enumerate() {
            let row = idx + 1;
            let parsed = match result {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(row, error = %e, "CSV 行解析失败");
                    report.failures.push(RowFailure {
                        row,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self.inventory.create_item(parsed.into_new_item()) {
                Ok(item) => report.imported_ids.push(item.item_id),
                Err(e) => {
                    warn!(row, code = e.code(), error = %e, "物品建档失败");
                    report.failures.push(RowFailure {
                        row,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }
}
