// ==========================================
// 剧院制作后台 - 演示数据初始化
// ==========================================
// 用法: seed_demo_data [db_path]
// 说明: 已存在的数据库先备份再重建
// ==========================================

use chrono::{Local, NaiveDate, Utc};
use std::error::Error;
use std::fs;
use std::path::Path;

use theater_backoffice::app::{get_default_db_path, AppState};
use theater_backoffice::domain::{Actor, MaterialLine, NewOrder, Play, Staff};
use theater_backoffice::domain::types::{PaymentMethod, StaffRole};
use theater_backoffice::logging;

// 物品台账 (列名与 ItemCsvImporter 一致)
const DEMO_ITEMS_CSV: &str = "\
name,category,current_stock,unit,low_stock_threshold
Stage Lights,Equipment,20,pcs,5
Microphones,Equipment,15,pcs,3
Speakers,Equipment,10,pcs,2
Sound Mixer,Equipment,5,pcs,1
Costumes – Male,Costumes,50,pcs,10
Costumes – Female,Costumes,50,pcs,10
Props – Chairs,Props,30,pcs,5
Props – Tables,Props,15,pcs,3
Props – Lanterns,Props,20,pcs,5
Script Copies,Materials,100,pcs,20
Notebooks,Materials,50,pcs,10
Markers,Materials,30,pcs,5
Paint Brushes,Materials,25,pcs,5
Stage Curtains,Equipment,5,pcs,1
Makeup Kits,Costumes,20,kits,5
Hair Wigs,Costumes,15,pcs,3
";

const DEMO_STAFF: [(&str, &str, StaffRole); 6] = [
    ("staff-admin", "Grace Wanjiku", StaffRole::Administration),
    ("staff-finance", "Peter Otieno", StaffRole::Finance),
    ("staff-store", "Jane Mwangi", StaffRole::Inventory),
    ("staff-procurement", "Ali Hassan", StaffRole::Procurement),
    ("staff-production", "Mary Achieng", StaffRole::Production),
    ("supplier-stagecraft", "Stagecraft Supplies Ltd", StaffRole::Supplier),
];

const DEMO_ACTORS: [(&str, &str); 4] = [
    ("actor-amani", "Amani Kariuki"),
    ("actor-baraka", "Baraka Njoroge"),
    ("actor-zawadi", "Zawadi Chebet"),
    ("actor-imani", "Imani Atieno"),
];

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;
    let state = AppState::new(db_path.clone())?;

    // 物品台账
    let report = state.item_importer.import_reader(DEMO_ITEMS_CSV.as_bytes())?;
    for failure in &report.failures {
        eprintln!("item row {} skipped: {}", failure.row, failure.reason);
    }

    seed_people(&state)?;
    seed_plays(&state)?;
    seed_workflows(&state)?;

    print_quick_counts(&state, &db_path)?;
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_people(state: &AppState) -> Result<(), Box<dyn Error>> {
    let now = Utc::now().naive_utc();

    for (staff_id, name, role) in DEMO_STAFF {
        state.staff_repo.insert(&Staff {
            staff_id: staff_id.to_string(),
            name: name.to_string(),
            email: None,
            department: role.to_string(),
            position: None,
            role,
            is_active: true,
            created_at: now,
        })?;
    }

    for (actor_id, name) in DEMO_ACTORS {
        state.actor_repo.insert(&Actor {
            actor_id: actor_id.to_string(),
            name: name.to_string(),
            email: None,
            is_active: true,
            created_at: now,
        })?;
    }
    Ok(())
}

fn seed_plays(state: &AppState) -> Result<(), Box<dyn Error>> {
    let now = Utc::now().naive_utc();
    let plays = [
        ("play-lion", "The Lion and the Jewel", "Mary Achieng", (2026, 11, 6), (2026, 11, 22)),
        ("play-river", "The River Between", "Ali Hassan", (2026, 12, 4), (2026, 12, 20)),
    ];

    for (play_id, title, director, start, end) in plays {
        state.play_repo.create_play(&Play {
            play_id: play_id.to_string(),
            title: title.to_string(),
            description: None,
            director: Some(director.to_string()),
            venue: Some("Main Hall".to_string()),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2),
            created_at: now,
        })?;
    }

    let assignments = [
        ("play-lion", "actor-amani", "Lakunle"),
        ("play-lion", "actor-zawadi", "Sidi"),
        ("play-lion", "actor-baraka", "Baroka"),
        ("play-river", "actor-imani", "Nyambura"),
        ("play-river", "actor-baraka", "Waiyaki"),
    ];
    for (play_id, actor_id, role_name) in assignments {
        state.play_repo.assign_actor(play_id, actor_id, Some(role_name))?;
    }
    Ok(())
}

fn seed_workflows(state: &AppState) -> Result<(), Box<dyn Error>> {
    let requests = &state.material_request_api;

    // 已领取
    let collected = requests.submit(
        "play-lion",
        "actor-amani",
        vec![MaterialLine::new("Costumes – Male", 2, "pcs")],
    )?;
    requests.approve(collected.request_id.as_str(), "staff-production")?;
    requests.mark_processing(collected.request_id.as_str(), "staff-store")?;
    requests.prepare(collected.request_id.as_str(), "staff-store")?;
    requests.collect(collected.request_id.as_str(), "actor-amani")?;

    // 备料中
    let processing = requests.submit(
        "play-lion",
        "actor-zawadi",
        vec![
            MaterialLine::new("Hair Wigs", 1, "pcs"),
            MaterialLine::new("Makeup Kits", 1, "kits"),
        ],
    )?;
    requests.approve(processing.request_id.as_str(), "staff-production")?;
    requests.mark_processing(processing.request_id.as_str(), "staff-store")?;

    // 待审批
    requests.submit(
        "play-river",
        "actor-imani",
        vec![MaterialLine::new("Props – Lanterns", 3, "pcs")],
    )?;

    // 采购: 已付款待供应商确认
    let lights = state
        .inventory_api
        .list_items(true)?
        .into_iter()
        .find(|item| item.name == "Stage Lights");

    let orders = &state.order_api;
    let paid = orders.create(NewOrder {
        item_id: lights.map(|item| item.item_id),
        supplier_id: Some("supplier-stagecraft".to_string()),
        supplier_name: Some("Stagecraft Supplies Ltd".to_string()),
        quantity: 4,
        unit_price: 85.0,
        description: Some("LED par cans".to_string()),
        requester_id: Some("staff-procurement".to_string()),
        ..NewOrder::default()
    })?;
    orders.approve(&paid.order_id, "staff-admin")?;
    orders.mark_processing(&paid.order_id, "staff-procurement")?;
    orders.mark_delivered(&paid.order_id, "staff-procurement", Some("SC-20461".to_string()), None)?;
    orders.mark_received(&paid.order_id, "staff-store")?;
    orders.submit_payment(&paid.order_id, "staff-procurement", Some(PaymentMethod::MPesa), Some("QK81X2".to_string()), None)?;
    orders.approve_payment(&paid.order_id, "staff-finance")?;
    orders.process_payment(&paid.order_id, "staff-finance", None, None, None, None)?;

    // 采购: 待审批
    orders.create(NewOrder {
        item_name: Some("Fog machine fluid".to_string()),
        supplier_name: Some("Nairobi Sound & Light".to_string()),
        quantity: 6,
        unit_price: 12.5,
        ..NewOrder::default()
    })?;
    Ok(())
}

fn print_quick_counts(state: &AppState, db_path: &str) -> Result<(), Box<dyn Error>> {
    let stats = state.dashboard_api.material_request_stats()?;
    let finance = state.dashboard_api.finance_summary()?;
    let items = state.inventory_api.list_items(true)?;

    println!("Seeded demo database: {}", db_path);
    println!("  items: {}", items.len());
    println!("  material requests: {}", stats.total);
    println!("  orders: {}", finance.total_orders);
    println!(
        "  paid awaiting supplier confirmation: {}",
        finance.paid_unconfirmed.count
    );
    Ok(())
}
