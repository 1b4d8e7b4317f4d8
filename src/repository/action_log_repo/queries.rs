use super::core::ActionLogRepository;
use crate::domain::action_log::{ActionLog, EntityType};
use crate::repository::error::RepositoryResult;
use crate::repository::sql_utils::parse_ts;
use rusqlite::{params, Result as SqliteResult, Row};

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询实体的全部日志 (按时间正序, 即历史顺序)
    pub fn find_by_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, entity_type, entity_id, action_type, action_ts,
                   actor_id, actor_name, payload_json, detail
            FROM action_log
            WHERE entity_type = ? AND entity_id = ?
            ORDER BY action_ts ASC, rowid ASC
            "#,
        )?;

        let logs = stmt
            .query_map(params![entity_type.as_str(), entity_id], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询最近的 N 条日志
    pub fn find_recent(&self, limit: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, entity_type, entity_id, action_type, action_ts,
                   actor_id, actor_name, payload_json, detail
            FROM action_log
            ORDER BY action_ts DESC, rowid DESC
            LIMIT ?
            "#,
        )?;

        let logs = stmt
            .query_map(params![limit], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询指定操作人的日志
    pub fn find_by_actor(&self, actor_id: &str, limit: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, entity_type, entity_id, action_type, action_ts,
                   actor_id, actor_name, payload_json, detail
            FROM action_log
            WHERE actor_id = ?
            ORDER BY action_ts DESC
            LIMIT ?
            "#,
        )?;

        let logs = stmt
            .query_map(params![actor_id, limit], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 统计实体日志条数
    pub fn count_by_entity(&self, entity_type: EntityType, entity_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE entity_type = ? AND entity_id = ?",
            params![entity_type.as_str(), entity_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 将数据库行映射为 ActionLog 实体
    fn map_row(&self, row: &Row) -> SqliteResult<ActionLog> {
        let entity_type_str: String = row.get(1)?;
        let entity_type = EntityType::from_str(&entity_type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("未知实体类型: {}", entity_type_str).into(),
            )
        })?;
        let action_ts_str: String = row.get(4)?;
        let payload_json_str: Option<String> = row.get(7)?;

        Ok(ActionLog {
            action_id: row.get(0)?,
            entity_type,
            entity_id: row.get(2)?,
            action_type: row.get(3)?,
            action_ts: parse_ts(4, &action_ts_str)?,
            actor_id: row.get(5)?,
            actor_name: row.get(6)?,
            payload_json: payload_json_str.and_then(|s| serde_json::from_str(&s).ok()),
            detail: row.get(8)?,
        })
    }
}
