// ==========================================
// 剧院制作后台 - 仓储层公共函数
// ==========================================
// 职责: 时间/日期/JSON 列的编解码, 乐观锁失败判定
// ==========================================

use crate::db::{DATE_FORMAT, TS_FORMAT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// 时间戳 → 存储文本
pub fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 日期 → 存储文本
pub fn fmt_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_failure<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// 解析时间戳列 (兼容无小数秒的旧数据)
pub fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| conversion_failure(idx, e))
}

/// 解析可空时间戳列
pub fn parse_opt_ts(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDateTime>> {
    raw.map(|s| parse_ts(idx, &s)).transpose()
}

/// 解析可空日期列
pub fn parse_opt_date(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    raw.map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_failure(idx, e)))
        .transpose()
}

/// 解析 JSON 列
pub fn parse_json<T: DeserializeOwned>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| conversion_failure(idx, e))
}

/// 解析可空 JSON 列
pub fn parse_opt_json<T: DeserializeOwned>(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<T>> {
    raw.map(|s| parse_json(idx, &s)).transpose()
}

/// 可空值 → JSON 文本
pub fn to_opt_json<T: Serialize>(value: Option<&T>) -> RepositoryResult<Option<String>> {
    value
        .map(|v| serde_json::to_string(v).map_err(RepositoryError::from))
        .transpose()
}

/// 条件更新影响 0 行时区分 "记录不存在" 与 "版本冲突"
///
/// # 参数
/// - `table` / `id_column`: 代码内常量 (不接受外部输入)
/// - `expected`: 调用方读取时的 revision
pub fn revision_miss(
    conn: &Connection,
    table: &str,
    id_column: &str,
    entity: &str,
    id: &str,
    expected: i32,
) -> RepositoryError {
    let sql = format!("SELECT revision FROM {} WHERE {} = ?1", table, id_column);
    let actual: Result<Option<i32>, rusqlite::Error> = conn
        .query_row(&sql, params![id], |row| row.get(0))
        .optional();

    match actual {
        Ok(Some(actual)) => RepositoryError::OptimisticLockFailure {
            entity: entity.to_string(),
            id: id.to_string(),
            expected,
            actual,
        },
        Ok(None) => RepositoryError::not_found(entity, id),
        Err(e) => e.into(),
    }
}
