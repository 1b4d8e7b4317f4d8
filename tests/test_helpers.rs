// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、基础数据写入
// ==========================================

#![allow(dead_code)]

use std::error::Error;

use rusqlite::Connection;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    theater_backoffice::db::open_and_migrate(&db_path)?;

    Ok((temp_file, db_path))
}

/// 直接打开测试库 (绕过 API, 用于构造并发/陈旧写入场景)
pub fn open_raw(db_path: &str) -> Connection {
    theater_backoffice::db::open_sqlite_connection(db_path).unwrap()
}
