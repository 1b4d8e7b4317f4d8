// ==========================================
// 剧院制作后台 - 采购订单数据仓储
// ==========================================
// 存储: purchase_order 表
// - 付款记录以 payment_json 整体存储
// - payment_status / supplier_confirmation / payment_submitted_at 冗余为列, 供筛选与统计
// 并发: 更新以 revision 为条件
// ==========================================

mod core;
mod queries;


pub use core::OrderRepository;
pub use queries::PaymentStatusTotal;
