// ==========================================
// 物品台账导入集成测试
// ==========================================
// 测试目标: 验证 CSV 文件 → 物品建档 → 库存查询的完整流程
// ==========================================

mod helpers;

use std::io::Write;
use std::path::Path;

use helpers::api_test_helper::ApiTestEnv;
use tempfile::Builder;
use theater_backoffice::domain::ItemCategory;
use theater_backoffice::importer::ImportError;
use theater_backoffice::logging;

const ITEMS_CSV: &str = "\
Name , Category , Current_Stock , Unit , Low_Stock_Threshold , Unit_Cost
Stage Lights,Equipment,20,pcs,5,45.0
Sound Mixer,equipment,1,pcs,1,
Makeup Kits,Costumes,20,kits,5,12.5
Hammer,Tools,2,pcs,3,
Broken Row,Props,lots,pcs,1,
";

#[test]
fn test_import_file_then_query_inventory() {
    logging::init_test();
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(ITEMS_CSV.as_bytes()).unwrap();

    let report = env.item_importer.import_file(file.path()).unwrap();
    assert_eq!(report.imported(), 4);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].row, 5);

    let items = env.inventory_api.list_items(true).unwrap();
    assert_eq!(items.len(), 4);

    let kits = items.iter().find(|i| i.name == "Makeup Kits").unwrap();
    assert_eq!(kits.unit, "kits");
    assert_eq!(kits.unit_cost, 12.5);
    assert_eq!(kits.category, ItemCategory::Costumes);

    let mixer = items.iter().find(|i| i.name == "Sound Mixer").unwrap();
    assert_eq!(mixer.category, ItemCategory::Equipment);

    let hammer = items.iter().find(|i| i.name == "Hammer").unwrap();
    assert_eq!(hammer.category, ItemCategory::Equipment);

    // 导入的物品参与库存工作流
    let low: Vec<String> = env
        .inventory_api
        .list_low_stock_items()
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert!(low.contains(&"Sound Mixer".to_string()));
    assert!(low.contains(&"Hammer".to_string()));
    assert!(!low.contains(&"Stage Lights".to_string()));

    let after = env.inventory_api.debit(&hammer.item_id, 2).unwrap();
    assert_eq!(after.current_stock, 0);
}

#[test]
fn test_missing_file_reports_localized_error() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env
        .item_importer
        .import_file(Path::new("/definitely/not/here.csv"))
        .unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound(_)));
    assert!(err.localized_message().contains("/definitely/not/here.csv"));
    assert!(env.inventory_api.list_items(false).unwrap().is_empty());
}
