// ==========================================
// 剧院制作后台 - 应用层
// ==========================================
// 职责: 装配 Repository / 配置 / API, 供入口程序使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
