// ==========================================
// 剧院制作后台 - 导入层
// ==========================================
// 职责: 外部台账导入 (采购建档)
// 支持: CSV
// ==========================================

// 模块声明
pub mod error;
pub mod item_csv;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use item_csv::{ImportReport, ItemCsvImporter, RowFailure};
