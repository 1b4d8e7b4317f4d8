// ==========================================
// 剧院制作后台 - 物料申领数据仓储
// ==========================================
// 权威存储: material_request 表
// 并发: 更新以 revision 为条件, 不一致时返回 OptimisticLockFailure
// ==========================================

use crate::domain::material_request::MaterialRequest;
use crate::domain::types::MaterialRequestStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{
    fmt_ts, parse_json, parse_opt_json, parse_opt_ts, parse_ts, revision_miss, to_opt_json,
};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const REQUEST_COLUMNS: &str = r#"
    request_id, play_id, actor_id, materials_json, status, notes,
    requested_at, approved_at, processing_at, prepared_at, collected_at, rejected_at,
    prepared_by_json, rejection_reason, updated_at, revision
"#;

/// 按剧目统计的状态计数行
#[derive(Debug, Clone)]
pub struct PlayStatusCount {
    pub play_id: String,
    pub status: MaterialRequestStatus,
    pub count: i64,
}

pub struct MaterialRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialRequestRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入 (事务内)
    // ==========================================

    pub fn insert_in(conn: &Connection, request: &MaterialRequest) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO material_request (
                request_id, play_id, actor_id, materials_json, status, notes,
                requested_at, approved_at, processing_at, prepared_at, collected_at, rejected_at,
                prepared_by_json, rejection_reason, updated_at, revision
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                request.request_id,
                request.play_id,
                request.actor_id,
                serde_json::to_string(&request.materials)?,
                request.status.to_db_str(),
                request.notes,
                fmt_ts(&request.requested_at),
                request.approved_at.as_ref().map(fmt_ts),
                request.processing_at.as_ref().map(fmt_ts),
                request.prepared_at.as_ref().map(fmt_ts),
                request.collected_at.as_ref().map(fmt_ts),
                request.rejected_at.as_ref().map(fmt_ts),
                to_opt_json(request.prepared_by.as_ref())?,
                request.rejection_reason,
                fmt_ts(&request.updated_at),
                request.revision,
            ],
        )?;
        Ok(())
    }

    /// 以读取时的 revision 为条件写回
    ///
    /// # 返回
    /// - `Ok(new_revision)`
    /// - `Err(OptimisticLockFailure)`: 读取后已被他人修改
    /// - `Err(NotFound)`: 记录不存在
    pub fn update_in(conn: &Connection, request: &MaterialRequest) -> RepositoryResult<i32> {
        let affected = conn.execute(
            r#"
            UPDATE material_request
            SET status = ?1, notes = ?2,
                approved_at = ?3, processing_at = ?4, prepared_at = ?5,
                collected_at = ?6, rejected_at = ?7,
                prepared_by_json = ?8, rejection_reason = ?9,
                updated_at = ?10, revision = revision + 1
            WHERE request_id = ?11 AND revision = ?12
            "#,
            params![
                request.status.to_db_str(),
                request.notes,
                request.approved_at.as_ref().map(fmt_ts),
                request.processing_at.as_ref().map(fmt_ts),
                request.prepared_at.as_ref().map(fmt_ts),
                request.collected_at.as_ref().map(fmt_ts),
                request.rejected_at.as_ref().map(fmt_ts),
                to_opt_json(request.prepared_by.as_ref())?,
                request.rejection_reason,
                fmt_ts(&request.updated_at),
                request.request_id,
                request.revision,
            ],
        )?;

        if affected == 0 {
            return Err(revision_miss(
                conn,
                "material_request",
                "request_id",
                "MaterialRequest",
                &request.request_id,
                request.revision,
            ));
        }
        Ok(request.revision + 1)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_by_id(&self, request_id: &str) -> RepositoryResult<Option<MaterialRequest>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in(&conn, request_id)
    }

    pub fn find_by_id_in(conn: &Connection, request_id: &str) -> RepositoryResult<Option<MaterialRequest>> {
        let sql = format!("SELECT {} FROM material_request WHERE request_id = ?1", REQUEST_COLUMNS);
        let request = conn
            .query_row(&sql, params![request_id], Self::map_row)
            .optional()?;
        Ok(request)
    }

    /// 演员在该剧目下是否已有待审批申领
    pub fn has_pending_in(conn: &Connection, play_id: &str, actor_id: &str) -> RepositoryResult<bool> {
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM material_request
            WHERE play_id = ?1 AND actor_id = ?2 AND status = 'pending'
            "#,
            params![play_id, actor_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn list_by_play(&self, play_id: &str) -> RepositoryResult<Vec<MaterialRequest>> {
        let conn = self.get_conn()?;
        Self::list_by_play_in(&conn, play_id)
    }

    pub fn list_by_play_in(conn: &Connection, play_id: &str) -> RepositoryResult<Vec<MaterialRequest>> {
        let sql = format!(
            "SELECT {} FROM material_request WHERE play_id = ?1 ORDER BY requested_at DESC",
            REQUEST_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![play_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_by_actor(&self, actor_id: &str) -> RepositoryResult<Vec<MaterialRequest>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM material_request WHERE actor_id = ?1 ORDER BY requested_at DESC",
            REQUEST_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![actor_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn list_by_status(&self, status: MaterialRequestStatus) -> RepositoryResult<Vec<MaterialRequest>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM material_request WHERE status = ?1 ORDER BY play_id, requested_at",
            REQUEST_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![status.to_db_str()], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按 (play_id, status) 分组计数
    pub fn count_by_play_and_status(&self) -> RepositoryResult<Vec<PlayStatusCount>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT play_id, status, COUNT(*)
            FROM material_request
            GROUP BY play_id, status
            ORDER BY play_id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                let status: String = row.get(1)?;
                Ok((row.get::<_, String>(0)?, status, row.get::<_, i64>(2)?))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.into_iter()
            .map(|(play_id, status, count)| {
                let status = MaterialRequestStatus::from_str(&status).ok_or_else(|| {
                    RepositoryError::FieldValueError {
                        field: "status".to_string(),
                        message: format!("未知申领状态: {}", status),
                    }
                })?;
                Ok(PlayStatusCount { play_id, status, count })
            })
            .collect()
    }

    fn map_row(row: &Row) -> SqliteResult<MaterialRequest> {
        let status_str: String = row.get(4)?;
        let status = MaterialRequestStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("未知申领状态: {}", status_str).into(),
            )
        })?;

        Ok(MaterialRequest {
            request_id: row.get(0)?,
            play_id: row.get(1)?,
            actor_id: row.get(2)?,
            materials: parse_json(3, &row.get::<_, String>(3)?)?,
            status,
            notes: row.get(5)?,
            requested_at: parse_ts(6, &row.get::<_, String>(6)?)?,
            approved_at: parse_opt_ts(7, row.get(7)?)?,
            processing_at: parse_opt_ts(8, row.get(8)?)?,
            prepared_at: parse_opt_ts(9, row.get(9)?)?,
            collected_at: parse_opt_ts(10, row.get(10)?)?,
            rejected_at: parse_opt_ts(11, row.get(11)?)?,
            prepared_by: parse_opt_json(12, row.get(12)?)?,
            rejection_reason: row.get(13)?,
            updated_at: parse_ts(14, &row.get::<_, String>(14)?)?,
            revision: row.get(15)?,
        })
    }
}
