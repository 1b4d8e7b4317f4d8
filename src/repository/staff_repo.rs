// ==========================================
// 剧院制作后台 - 员工数据仓储
// ==========================================

use crate::domain::staff::Staff;
use crate::domain::types::StaffRole;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{fmt_ts, parse_ts};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct StaffRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StaffRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, staff: &Staff) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO staff (staff_id, name, email, department, position, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                staff.staff_id,
                staff.name,
                staff.email,
                staff.department,
                staff.position,
                staff.role.to_db_str(),
                staff.is_active,
                fmt_ts(&staff.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, staff_id: &str) -> RepositoryResult<Option<Staff>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in(&conn, staff_id)
    }

    pub fn find_by_id_in(conn: &Connection, staff_id: &str) -> RepositoryResult<Option<Staff>> {
        let staff = conn
            .query_row(
                r#"
                SELECT staff_id, name, email, department, position, role, is_active, created_at
                FROM staff WHERE staff_id = ?1
                "#,
                params![staff_id],
                Self::map_row,
            )
            .optional()?;
        Ok(staff)
    }

    fn map_row(row: &Row) -> SqliteResult<Staff> {
        let role: String = row.get(5)?;
        Ok(Staff {
            staff_id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            department: row.get(3)?,
            position: row.get(4)?,
            role: StaffRole::from_str(&role),
            is_active: row.get(6)?,
            created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
        })
    }
}
