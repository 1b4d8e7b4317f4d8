// ==========================================
// 剧院制作后台 - API 层
// ==========================================
// 职责: 工作流操作入口 (库存台账、物料申领、采购付款、看板查询)
// ==========================================

pub mod error;
pub mod identity;
pub mod validator;
pub mod inventory_api;
pub mod material_request_api;
pub mod order_api;
pub mod dashboard_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use identity::{require_role, IdentityResolver};
pub use inventory_api::InventoryApi;
pub use material_request_api::{MaterialRequestApi, RequestRef};
pub use order_api::OrderApi;
pub use dashboard_api::{
    AmountBucket, DashboardApi, FinanceSummary, MaterialRequestStats, MaterialRequestView,
    PlayMaterialRequests, PlayRequestStats,
};
