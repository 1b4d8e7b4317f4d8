// ==========================================
// 剧院制作后台 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表 (ensure_schema)，并记录 schema_version
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式 (含小数秒, 保证同一秒内写入仍可排序)
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 幂等建表
///
/// 说明：
/// - 全部使用 CREATE TABLE IF NOT EXISTS，可在已有库上重复执行
/// - 建表完成后写入 CURRENT_SCHEMA_VERSION
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 打开连接并确保表结构存在
pub fn open_and_migrate(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    ensure_schema(&conn)?;

    if let Some(v) = read_schema_version(&conn)? {
        if v > CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                db_version = v,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema_version 高于当前程序版本"
            );
        }
    }

    Ok(conn)
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS item (
    item_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    category TEXT NOT NULL,
    unit TEXT NOT NULL DEFAULT 'pcs',
    location TEXT,
    current_stock INTEGER NOT NULL DEFAULT 0 CHECK (current_stock >= 0),
    low_stock_threshold INTEGER NOT NULL DEFAULT 10,
    min_stock_level INTEGER NOT NULL DEFAULT 5,
    max_stock_level INTEGER NOT NULL DEFAULT 100,
    reorder_point INTEGER NOT NULL DEFAULT 20,
    unit_cost REAL NOT NULL DEFAULT 0,
    selling_price REAL NOT NULL DEFAULT 0,
    supplier_id TEXT,
    supplier_name TEXT,
    last_restocked TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    revision INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_item_active ON item(is_active);

CREATE TABLE IF NOT EXISTS staff (
    staff_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    department TEXT NOT NULL,
    position TEXT,
    role TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS actor (
    actor_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS play (
    play_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    director TEXT,
    venue TEXT,
    start_date TEXT,
    end_date TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS play_actor (
    play_id TEXT NOT NULL REFERENCES play(play_id) ON DELETE CASCADE,
    actor_id TEXT NOT NULL,
    role_name TEXT,
    status TEXT NOT NULL DEFAULT 'Active',
    assigned_at TEXT NOT NULL,
    PRIMARY KEY (play_id, actor_id)
);

CREATE TABLE IF NOT EXISTS material_request (
    request_id TEXT PRIMARY KEY,
    play_id TEXT NOT NULL,
    actor_id TEXT NOT NULL,
    materials_json TEXT NOT NULL,
    status TEXT NOT NULL,
    notes TEXT,
    requested_at TEXT NOT NULL,
    approved_at TEXT,
    processing_at TEXT,
    prepared_at TEXT,
    collected_at TEXT,
    rejected_at TEXT,
    prepared_by_json TEXT,
    rejection_reason TEXT,
    updated_at TEXT NOT NULL,
    revision INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_material_request_play ON material_request(play_id, status);
CREATE INDEX IF NOT EXISTS idx_material_request_actor ON material_request(actor_id);

CREATE TABLE IF NOT EXISTS purchase_order (
    order_id TEXT PRIMARY KEY,
    item_id TEXT,
    item_name TEXT,
    supplier_id TEXT,
    supplier_name TEXT,
    quantity INTEGER NOT NULL CHECK (quantity >= 1),
    unit_price REAL NOT NULL,
    total_cost REAL NOT NULL,
    description TEXT,
    status TEXT NOT NULL,
    requested_by_json TEXT,
    order_date TEXT NOT NULL,
    estimated_delivery TEXT,
    delivery_date TEXT,
    tracking_number TEXT,
    rejection_reason TEXT,
    cancellation_reason TEXT,
    stock_credited INTEGER NOT NULL DEFAULT 0,
    payment_status TEXT NOT NULL DEFAULT 'Pending',
    supplier_confirmation INTEGER NOT NULL DEFAULT 0,
    payment_submitted_at TEXT,
    payment_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    revision INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_order_status ON purchase_order(status, payment_status);
CREATE INDEX IF NOT EXISTS idx_order_supplier ON purchase_order(supplier_id);

CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor_id TEXT,
    actor_name TEXT,
    payload_json TEXT,
    detail TEXT
);
CREATE INDEX IF NOT EXISTS idx_action_log_entity ON action_log(entity_type, entity_id);
CREATE INDEX IF NOT EXISTS idx_action_log_ts ON action_log(action_ts);
"#;
