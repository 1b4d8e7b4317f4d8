// ==========================================
// 剧院制作后台 - 操作日志数据仓储
// ==========================================
// 存储: action_log 表
// 红线: 所有工作流写入必须记录 (与状态变更同一事务)
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
