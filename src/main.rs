// ==========================================
// 剧院制作后台 - 命令行入口
// ==========================================
// 用法:
//   theater-backoffice                 输出看板快照 (JSON)
//   theater-backoffice <items.csv>     先导入物品台账, 再输出看板快照
// 数据库路径: THEATER_BACKOFFICE_DB_PATH 或用户数据目录
// ==========================================

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use theater_backoffice::app::{get_default_db_path, AppState};
use theater_backoffice::{logging, APP_NAME, VERSION};

fn main() -> Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} 系统版本: {}", APP_NAME, VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    if let Some(csv_path) = std::env::args().nth(1) {
        let report = state
            .item_importer
            .import_file(Path::new(&csv_path))
            .map_err(|e| anyhow!(e.localized_message()))
            .with_context(|| format!("导入物品台账失败: {}", csv_path))?;
        tracing::info!(
            imported = report.imported(),
            failed = report.failures.len(),
            "物品台账导入完成"
        );
        for failure in &report.failures {
            tracing::warn!(row = failure.row, reason = %failure.reason, "导入行失败");
        }
    }

    let snapshot = json!({
        "app": APP_NAME,
        "version": VERSION,
        "material_requests": state.dashboard_api.material_request_stats()?,
        "finance": state.dashboard_api.finance_summary()?,
        "low_stock_items": state.inventory_api.list_low_stock_items()?,
        "pending_supplier_confirmation": state
            .dashboard_api
            .orders_pending_supplier_confirmation(None)?,
    });

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
