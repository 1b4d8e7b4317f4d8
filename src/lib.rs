// ==========================================
// 剧院制作后台 - 核心库
// ==========================================
// 职责: 物料申领、库存台账、采购订单与付款工作流
// 技术栈: Rust + SQLite
// 系统定位: 工作流核心 (不含 HTTP 路由与会话)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 状态迁移规则
pub mod engine;

// 导入层 - 物品台账
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 工作流接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AssignmentStatus, ItemCategory, MaterialRequestStatus, OrderStatus, PaymentMethod,
    PaymentStatus, StaffRole,
};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Actor, EntityType, IdentityStamp, Item, MaterialLine,
    MaterialRequest, NewItem, NewOrder, Order, Payment, Play, Staff,
};

// 引擎
pub use engine::{MaterialRequestFlow, OrderFlow, TransitionViolation};

// API
pub use api::{ApiError, ApiResult, DashboardApi, InventoryApi, MaterialRequestApi, OrderApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "剧院制作后台";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
