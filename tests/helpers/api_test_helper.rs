// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 基于临时数据库文件装配完整 AppState, 并写入基础人员/剧目数据
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use tempfile::NamedTempFile;

use theater_backoffice::api::{DashboardApi, InventoryApi, MaterialRequestApi, OrderApi};
use theater_backoffice::app::AppState;
use theater_backoffice::config::ConfigManager;
use theater_backoffice::domain::types::StaffRole;
use theater_backoffice::domain::{Actor, Item, NewItem, Play, Staff};
use theater_backoffice::importer::ItemCsvImporter;
use theater_backoffice::repository::{
    ActionLogRepository, ActorRepository, PlayRepository, StaffRepository,
};

// ==========================================
// 基础人员
// ==========================================

pub const ADMIN: &str = "staff-admin";
pub const FINANCE: &str = "staff-finance";
pub const STORE: &str = "staff-store";
pub const PRODUCTION: &str = "staff-production";
pub const SUPPLIER: &str = "supplier-1";
pub const OTHER_SUPPLIER: &str = "supplier-2";
pub const RETIRED: &str = "staff-retired";

pub const PLAY: &str = "play-p";
pub const ACTOR_A: &str = "actor-a";
pub const ACTOR_B: &str = "actor-b";

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例和必要的依赖
pub struct ApiTestEnv {
    pub db_path: String,
    pub inventory_api: Arc<InventoryApi>,
    pub material_request_api: Arc<MaterialRequestApi>,
    pub order_api: Arc<OrderApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub item_importer: Arc<ItemCsvImporter>,
    pub config_manager: Arc<ConfigManager>,

    // Repository层（用于测试数据准备）
    pub play_repo: Arc<PlayRepository>,
    pub actor_repo: Arc<ActorRepository>,
    pub staff_repo: Arc<StaffRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 空库环境
    pub fn new() -> Result<Self, String> {
        let temp_file = NamedTempFile::new().map_err(|e| e.to_string())?;
        let db_path = temp_file.path().to_string_lossy().to_string();
        let state = AppState::new(db_path.clone())?;

        Ok(Self {
            db_path,
            inventory_api: state.inventory_api,
            material_request_api: state.material_request_api,
            order_api: state.order_api,
            dashboard_api: state.dashboard_api,
            item_importer: state.item_importer,
            config_manager: state.config_manager,
            play_repo: state.play_repo,
            actor_repo: state.actor_repo,
            staff_repo: state.staff_repo,
            action_log_repo: state.action_log_repo,
            _temp_file: temp_file,
        })
    }

    /// 含基础人员、剧目 P 与演员 A/B (均已分配到 P)
    pub fn seeded() -> Result<Self, String> {
        let env = Self::new()?;
        for (id, role) in [
            (ADMIN, StaffRole::Administration),
            (FINANCE, StaffRole::Finance),
            (STORE, StaffRole::Inventory),
            (PRODUCTION, StaffRole::Production),
            (SUPPLIER, StaffRole::Supplier),
            (OTHER_SUPPLIER, StaffRole::Supplier),
        ] {
            env.add_staff(id, role, true);
        }
        env.add_staff(RETIRED, StaffRole::Finance, false);

        env.add_play(PLAY, "Play P");
        env.add_actor(ACTOR_A, "Actor A");
        env.add_actor(ACTOR_B, "Actor B");
        env.assign(PLAY, ACTOR_A);
        env.assign(PLAY, ACTOR_B);
        Ok(env)
    }

    pub fn add_staff(&self, staff_id: &str, role: StaffRole, is_active: bool) {
        self.staff_repo
            .insert(&Staff {
                staff_id: staff_id.to_string(),
                name: format!("{} name", staff_id),
                email: None,
                department: role.to_string(),
                position: None,
                role,
                is_active,
                created_at: Utc::now().naive_utc(),
            })
            .unwrap();
    }

    pub fn add_play(&self, play_id: &str, title: &str) {
        self.play_repo
            .create_play(&Play {
                play_id: play_id.to_string(),
                title: title.to_string(),
                description: None,
                director: None,
                venue: None,
                start_date: None,
                end_date: None,
                created_at: Utc::now().naive_utc(),
            })
            .unwrap();
    }

    pub fn add_actor(&self, actor_id: &str, name: &str) {
        self.actor_repo
            .insert(&Actor {
                actor_id: actor_id.to_string(),
                name: name.to_string(),
                email: None,
                is_active: true,
                created_at: Utc::now().naive_utc(),
            })
            .unwrap();
    }

    pub fn assign(&self, play_id: &str, actor_id: &str) {
        self.play_repo.assign_actor(play_id, actor_id, None).unwrap();
    }

    /// 建立物品
    pub fn add_item(&self, name: &str, stock: i64, low_stock_threshold: i64) -> Item {
        self.inventory_api
            .create_item(
                NewItem::new(name, theater_backoffice::ItemCategory::Props)
                    .with_stock(stock)
                    .with_thresholds(low_stock_threshold, 0),
            )
            .unwrap()
    }

    pub fn stock_of(&self, item_id: &str) -> i64 {
        self.inventory_api.get_item(item_id).unwrap().current_stock
    }

    /// 订单推进到 Delivered
    pub fn drive_order_to_delivered(&self, order_id: &str) {
        self.order_api.approve(order_id, ADMIN).unwrap();
        self.order_api.mark_processing(order_id, STORE).unwrap();
        self.order_api
            .mark_delivered(order_id, STORE, Some("TRK-001".to_string()), None)
            .unwrap();
    }

    /// 订单推进到 Payment Pending (已入库)
    pub fn drive_order_to_received(&self, order_id: &str) {
        self.drive_order_to_delivered(order_id);
        self.order_api.mark_received(order_id, STORE).unwrap();
    }
}
