// ==========================================
// 剧院制作后台 - 引擎层
// ==========================================
// 职责: 工作流状态迁移规则 (纯函数)
// 红线: Engine 不拼 SQL, 违规必须携带 from/to
// ==========================================

pub mod material_flow;
pub mod order_flow;
pub mod transition;

// 重导出核心引擎
pub use material_flow::{MaterialRequestAction, MaterialRequestFlow};
pub use order_flow::{OrderAction, OrderFlow, PaymentAction, PaymentTransition};
pub use transition::TransitionViolation;
