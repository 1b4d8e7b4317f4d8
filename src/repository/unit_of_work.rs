// ==========================================
// 剧院制作后台 - 事务边界
// ==========================================
// 红线: 耦合写入 (订单状态 + 库存 + 审计日志) 必须在同一事务内提交
// 说明: 闭包内只能调用 *_in(conn, ..) 形式的仓储函数,
//       不可再调用仓储实例方法 (连接锁不可重入)
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct UnitOfWork {
    conn: Arc<Mutex<Connection>>,
}

impl UnitOfWork {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在写事务中执行闭包
    ///
    /// # 返回
    /// - 闭包返回 Ok 时提交
    /// - 闭包返回 Err 时回滚 (Transaction drop 时自动回滚), 原错误原样返回
    pub fn run<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let out = f(&tx)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(out)
    }

    /// 只读访问 (不开启事务)
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let conn = self.get_conn()?;
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (v INTEGER NOT NULL)", []).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn count(conn: &Arc<Mutex<Connection>>) -> i64 {
        conn.lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_run_commits_on_ok() {
        let conn = setup();
        let uow = UnitOfWork::new(conn.clone());

        let result: RepositoryResult<()> = uow.run(|tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_run_rolls_back_on_err() {
        let conn = setup();
        let uow = UnitOfWork::new(conn.clone());

        let result: RepositoryResult<()> = uow.run(|tx| {
            tx.execute("INSERT INTO t (v) VALUES (1)", [])?;
            Err(RepositoryError::InternalError("abort".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(count(&conn), 0);
    }
}
