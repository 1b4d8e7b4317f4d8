// ==========================================
// 剧院制作后台 - 剧目 / 演员 / 分配数据仓储
// ==========================================

use crate::domain::play::{Actor, Play, PlayActorAssignment};
use crate::domain::types::AssignmentStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{fmt_date, fmt_ts, parse_opt_date, parse_ts};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// PlayRepository - 剧目仓储 (含演员分配)
// ==========================================
pub struct PlayRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlayRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn create_play(&self, play: &Play) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO play (play_id, title, description, director, venue, start_date, end_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                play.play_id,
                play.title,
                play.description,
                play.director,
                play.venue,
                play.start_date.as_ref().map(fmt_date),
                play.end_date.as_ref().map(fmt_date),
                fmt_ts(&play.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, play_id: &str) -> RepositoryResult<Option<Play>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in(&conn, play_id)
    }

    pub fn find_by_id_in(conn: &Connection, play_id: &str) -> RepositoryResult<Option<Play>> {
        let play = conn
            .query_row(
                r#"
                SELECT play_id, title, description, director, venue, start_date, end_date, created_at
                FROM play WHERE play_id = ?1
                "#,
                params![play_id],
                Self::map_play,
            )
            .optional()?;
        Ok(play)
    }

    pub fn list_plays(&self) -> RepositoryResult<Vec<Play>> {
        let conn = self.get_conn()?;
        Self::list_plays_in(&conn)
    }

    pub fn list_plays_in(conn: &Connection) -> RepositoryResult<Vec<Play>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT play_id, title, description, director, venue, start_date, end_date, created_at
            FROM play ORDER BY title
            "#,
        )?;
        let plays = stmt
            .query_map([], Self::map_play)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(plays)
    }

    /// 分配演员 (重复分配时恢复为 Active 并更新角色名)
    pub fn assign_actor(
        &self,
        play_id: &str,
        actor_id: &str,
        role_name: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = chrono::Utc::now().naive_utc();
        conn.execute(
            r#"
            INSERT INTO play_actor (play_id, actor_id, role_name, status, assigned_at)
            VALUES (?1, ?2, ?3, 'Active', ?4)
            ON CONFLICT(play_id, actor_id) DO UPDATE SET status = 'Active', role_name = ?3
            "#,
            params![play_id, actor_id, role_name, fmt_ts(&now)],
        )?;
        Ok(())
    }

    pub fn set_assignment_status(
        &self,
        play_id: &str,
        actor_id: &str,
        status: AssignmentStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE play_actor SET status = ?1 WHERE play_id = ?2 AND actor_id = ?3",
            params![status.to_db_str(), play_id, actor_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found(
                "PlayActorAssignment",
                &format!("{}/{}", play_id, actor_id),
            ));
        }
        Ok(())
    }

    /// 查询有效 (Active) 的演员分配
    pub fn find_active_assignment_in(
        conn: &Connection,
        play_id: &str,
        actor_id: &str,
    ) -> RepositoryResult<Option<PlayActorAssignment>> {
        let assignment = conn
            .query_row(
                r#"
                SELECT play_id, actor_id, role_name, status, assigned_at
                FROM play_actor
                WHERE play_id = ?1 AND actor_id = ?2 AND status = 'Active'
                "#,
                params![play_id, actor_id],
                Self::map_assignment,
            )
            .optional()?;
        Ok(assignment)
    }

    pub fn find_active_assignment(
        &self,
        play_id: &str,
        actor_id: &str,
    ) -> RepositoryResult<Option<PlayActorAssignment>> {
        let conn = self.get_conn()?;
        Self::find_active_assignment_in(&conn, play_id, actor_id)
    }

    pub fn list_assignments(&self, play_id: &str) -> RepositoryResult<Vec<PlayActorAssignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT play_id, actor_id, role_name, status, assigned_at
            FROM play_actor WHERE play_id = ?1 ORDER BY assigned_at
            "#,
        )?;
        let rows = stmt
            .query_map(params![play_id], Self::map_assignment)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn map_play(row: &Row) -> SqliteResult<Play> {
        Ok(Play {
            play_id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            director: row.get(3)?,
            venue: row.get(4)?,
            start_date: parse_opt_date(5, row.get(5)?)?,
            end_date: parse_opt_date(6, row.get(6)?)?,
            created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
        })
    }

    fn map_assignment(row: &Row) -> SqliteResult<PlayActorAssignment> {
        let status: String = row.get(3)?;
        Ok(PlayActorAssignment {
            play_id: row.get(0)?,
            actor_id: row.get(1)?,
            role_name: row.get(2)?,
            status: AssignmentStatus::from_str(&status),
            assigned_at: parse_ts(4, &row.get::<_, String>(4)?)?,
        })
    }
}

// ==========================================
// ActorRepository - 演员仓储
// ==========================================
pub struct ActorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActorRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, actor: &Actor) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO actor (actor_id, name, email, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                actor.actor_id,
                actor.name,
                actor.email,
                actor.is_active,
                fmt_ts(&actor.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, actor_id: &str) -> RepositoryResult<Option<Actor>> {
        let conn = self.get_conn()?;
        let actor = conn
            .query_row(
                "SELECT actor_id, name, email, is_active, created_at FROM actor WHERE actor_id = ?1",
                params![actor_id],
                |row| {
                    Ok(Actor {
                        actor_id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        is_active: row.get(3)?,
                        created_at: parse_ts(4, &row.get::<_, String>(4)?)?,
                    })
                },
            )
            .optional()?;
        Ok(actor)
    }

    pub fn delete(&self, actor_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(conn.execute("DELETE FROM actor WHERE actor_id = ?1", params![actor_id])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn make_play(play_id: &str) -> Play {
        Play {
            play_id: play_id.to_string(),
            title: "Macbeth".to_string(),
            description: None,
            director: None,
            venue: Some("Main Stage".to_string()),
            start_date: chrono::NaiveDate::from_ymd_opt(2025, 5, 1),
            end_date: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_assignment_lifecycle() {
        let repo = PlayRepository::new(setup_test_db());
        repo.create_play(&make_play("p1")).unwrap();
        repo.assign_actor("p1", "a1", Some("Lady Macbeth")).unwrap();

        assert!(repo.find_active_assignment("p1", "a1").unwrap().is_some());

        repo.set_assignment_status("p1", "a1", AssignmentStatus::Inactive)
            .unwrap();
        assert!(repo.find_active_assignment("p1", "a1").unwrap().is_none());

        // 重复分配恢复 Active
        repo.assign_actor("p1", "a1", None).unwrap();
        assert!(repo.find_active_assignment("p1", "a1").unwrap().is_some());
        assert_eq!(repo.list_assignments("p1").unwrap().len(), 1);
    }

    #[test]
    fn test_set_status_on_missing_assignment() {
        let repo = PlayRepository::new(setup_test_db());
        repo.create_play(&make_play("p1")).unwrap();
        let err = repo
            .set_assignment_status("p1", "nobody", AssignmentStatus::Inactive)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_play_dates_round_trip() {
        let repo = PlayRepository::new(setup_test_db());
        repo.create_play(&make_play("p1")).unwrap();
        let play = repo.find_by_id("p1").unwrap().unwrap();
        assert_eq!(play.start_date, chrono::NaiveDate::from_ymd_opt(2025, 5, 1));
        assert!(play.end_date.is_none());
    }
}
