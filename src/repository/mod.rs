// ==========================================
// 剧院制作后台 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: xxx_in(conn, ..) 形式的函数供 UnitOfWork 事务内调用
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod item_repo;
pub mod material_request_repo;
pub mod order_repo;
pub mod play_repo;
pub mod sql_utils;
pub mod staff_repo;
pub mod unit_of_work;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use item_repo::ItemRepository;
pub use material_request_repo::{MaterialRequestRepository, PlayStatusCount};
pub use order_repo::{OrderRepository, PaymentStatusTotal};
pub use play_repo::{ActorRepository, PlayRepository};
pub use staff_repo::StaffRepository;
pub use unit_of_work::UnitOfWork;
