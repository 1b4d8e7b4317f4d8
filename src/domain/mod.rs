// ==========================================
// 剧院制作后台 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod item;
pub mod material_request;
pub mod order;
pub mod play;
pub mod staff;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType, EntityType};
pub use item::{Item, ItemEdit, NewItem};
pub use material_request::{MaterialLine, MaterialRequest};
pub use order::{NewOrder, Order, OrderEdit, Payment, PaymentDetailsEdit};
pub use play::{Actor, Play, PlayActorAssignment};
pub use staff::{IdentityStamp, Staff};
pub use types::{
    AssignmentStatus, ItemCategory, MaterialRequestStatus, OrderStatus, PaymentMethod,
    PaymentStatus, StaffRole,
};
