// ==========================================
// 剧院制作后台 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 装配顺序: 连接 → Repository → 配置/身份 → API
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{
    DashboardApi, IdentityResolver, InventoryApi, MaterialRequestApi, OrderApi,
};
use crate::config::config_manager::ConfigManager;
use crate::importer::ItemCsvImporter;
use crate::repository::{
    action_log_repo::ActionLogRepository,
    item_repo::ItemRepository,
    material_request_repo::MaterialRequestRepository,
    order_repo::OrderRepository,
    play_repo::{ActorRepository, PlayRepository},
    staff_repo::StaffRepository,
    unit_of_work::UnitOfWork,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "THEATER_BACKOFFICE_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 库存台账API
    pub inventory_api: Arc<InventoryApi>,

    /// 物料申领API
    pub material_request_api: Arc<MaterialRequestApi>,

    /// 采购订单与付款API
    pub order_api: Arc<OrderApi>,

    /// 看板查询API
    pub dashboard_api: Arc<DashboardApi>,

    /// 物品台账导入
    pub item_importer: Arc<ItemCsvImporter>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 剧目与演员仓储 (剧目建档、演员分配)
    pub play_repo: Arc<PlayRepository>,
    pub actor_repo: Arc<ActorRepository>,

    /// 员工仓储
    pub staff_repo: Arc<StaffRepository>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径 (":memory:" 为内存库)
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）并确保表结构
        let conn = crate::db::open_and_migrate(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        let mut state = Self::from_connection(Arc::new(Mutex::new(conn)))?;
        state.db_path = db_path;
        Ok(state)
    }

    /// 基于已有连接装配 (连接需已建表)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let item_repo = Arc::new(ItemRepository::new(conn.clone()));
        let staff_repo = Arc::new(StaffRepository::new(conn.clone()));
        let play_repo = Arc::new(PlayRepository::new(conn.clone()));
        let actor_repo = Arc::new(ActorRepository::new(conn.clone()));
        let request_repo = Arc::new(MaterialRequestRepository::new(conn.clone()));
        let order_repo = Arc::new(OrderRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let uow = Arc::new(UnitOfWork::new(conn.clone()));

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // 身份解析 (员工表)
        let identity: Arc<dyn IdentityResolver> = staff_repo.clone();

        // ==========================================
        // 初始化API层
        // ==========================================
        let inventory_api = Arc::new(InventoryApi::new(item_repo, uow.clone()));

        let material_request_api = Arc::new(MaterialRequestApi::new(
            request_repo.clone(),
            play_repo.clone(),
            action_log_repo.clone(),
            identity.clone(),
            config_manager.clone(),
            uow.clone(),
        ));

        let order_api = Arc::new(OrderApi::new(
            order_repo.clone(),
            identity,
            config_manager.clone(),
            uow,
        ));

        let dashboard_api = Arc::new(DashboardApi::new(
            request_repo,
            play_repo.clone(),
            actor_repo.clone(),
            order_repo,
            action_log_repo.clone(),
            config_manager.clone(),
        ));

        let item_importer = Arc::new(ItemCsvImporter::new(inventory_api.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path: String::new(),
            inventory_api,
            material_request_api,
            order_api,
            dashboard_api,
            item_importer,
            config_manager,
            play_repo,
            actor_repo,
            staff_repo,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 THEATER_BACKOFFICE_DB_PATH
/// 2. 用户数据目录/theater-backoffice/theater_backoffice.db
/// 3. 当前目录 ./theater_backoffice.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./theater_backoffice.db");

    // 尝试获取用户数据目录
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("theater-backoffice");

        // 确保目录存在; 创建失败时退回当前目录
        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join("theater_backoffice.db"),
            Err(e) => tracing::warn!("无法创建数据目录 {}: {}", dir.display(), e),
        }
    }

    path.to_string_lossy().to_string()
}
