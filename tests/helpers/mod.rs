// ==========================================
// 集成测试公共模块
// ==========================================

#![allow(dead_code)]

pub mod api_test_helper;
pub mod test_data_builder;
