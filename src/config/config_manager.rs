// ==========================================
// 剧院制作后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope, 当前仅 global)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::PaymentMethod;
use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 物料申领: 是否允许 approved → prepared (跳过 processing)
    pub const PREPARE_FROM_APPROVED: &str = "material_request.prepare_from_approved";

    // 财务: 最近付款动态默认条数
    pub const RECENT_PAYMENTS_LIMIT: &str = "finance.recent_payments_limit";

    // 订单: 提交付款未指定方式时的默认方式
    pub const DEFAULT_PAYMENT_METHOD: &str = "order.default_payment_method";
}

/// 默认值
pub const DEFAULT_RECENT_PAYMENTS_LIMIT: i64 = 20;

// ==========================================
// WorkflowConfig - 单次操作使用的配置快照
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowConfig {
    pub prepare_from_approved: bool,
    pub recent_payments_limit: i64,
    pub default_payment_method: PaymentMethod,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            prepare_from_approved: false,
            recent_payments_limit: DEFAULT_RECENT_PAYMENTS_LIMIT,
            default_payment_method: PaymentMethod::BankTransfer,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global 配置 (UPSERT)
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 工作流配置 =====

    pub fn get_prepare_from_approved(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_global_config_value(config_keys::PREPARE_FROM_APPROVED)?;
        Ok(match value.as_deref().map(|v| v.trim().to_lowercase()) {
            Some(v) => matches!(v.as_str(), "true" | "1" | "yes"),
            None => false,
        })
    }

    pub fn get_recent_payments_limit(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_global_config_value(config_keys::RECENT_PAYMENTS_LIMIT)?;
        let limit = match value {
            Some(raw) => raw.trim().parse::<i64>().unwrap_or_else(|_| {
                tracing::warn!(
                    config_key = config_keys::RECENT_PAYMENTS_LIMIT,
                    raw_value = %raw,
                    "配置格式错误，使用默认值"
                );
                DEFAULT_RECENT_PAYMENTS_LIMIT
            }),
            None => DEFAULT_RECENT_PAYMENTS_LIMIT,
        };
        Ok(if limit > 0 { limit } else { DEFAULT_RECENT_PAYMENTS_LIMIT })
    }

    pub fn get_default_payment_method(&self) -> Result<PaymentMethod, Box<dyn Error>> {
        let value = self.get_global_config_value(config_keys::DEFAULT_PAYMENT_METHOD)?;
        Ok(value
            .as_deref()
            .and_then(PaymentMethod::from_str)
            .unwrap_or(PaymentMethod::BankTransfer))
    }

    /// 加载工作流配置快照
    pub fn load_workflow_config(&self) -> Result<WorkflowConfig, Box<dyn Error>> {
        Ok(WorkflowConfig {
            prepare_from_approved: self.get_prepare_from_approved()?,
            recent_payments_limit: self.get_recent_payments_limit()?,
            default_payment_method: self.get_default_payment_method()?,
        })
    }
}
