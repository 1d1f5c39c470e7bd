use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::CoreError;
use crate::migrations::MIGRATIONS;

/// Host message store. Passes borrow it and run inside one transaction.
pub struct MessageStore {
    pub path: Option<PathBuf>,
    pub conn: Connection,
}

pub fn open_store(path: impl AsRef<Path>) -> Result<MessageStore, CoreError> {
    let path = path.as_ref().to_path_buf();
    let conn = Connection::open(&path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL; \
         PRAGMA synchronous = NORMAL; \
         PRAGMA foreign_keys = ON; \
         PRAGMA journal_size_limit = 67108864; \
         PRAGMA temp_store = MEMORY;",
    )?;
    apply_migrations(&conn)?;
    Ok(MessageStore {
        path: Some(path),
        conn,
    })
}

pub fn open_in_memory() -> Result<MessageStore, CoreError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    apply_migrations(&conn)?;
    Ok(MessageStore { path: None, conn })
}

pub fn apply_migrations(conn: &Connection) -> Result<(), CoreError> {
    let current_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let mut version = current_version as usize;
    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let next_version = idx + 1;
        if next_version <= version {
            continue;
        }
        conn.execute_batch(sql)?;
        conn.execute_batch(&format!("PRAGMA user_version = {};", next_version))?;
        version = next_version;
    }
    Ok(())
}

impl MessageStore {
    /// Runs `f` inside a deferred transaction that is always rolled back.
    pub fn read<T, E>(&mut self, f: impl FnOnce(&Transaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<CoreError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .map_err(CoreError::from)?;
        let result = f(&tx);
        tx.rollback().map_err(CoreError::from)?;
        result
    }

    /// Runs `f` inside an immediate transaction, committed only when `f`
    /// returns `Ok`.
    pub fn write<T, E>(&mut self, f: impl FnOnce(&Transaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<CoreError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(CoreError::from)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(CoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                let _ = tx.rollback();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_create_schema() {
        let conn = Connection::open_in_memory().expect("memory db");
        apply_migrations(&conn).expect("migrate");
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('messages', 'archived_payments');",
                [],
                |row| row.get(0),
            )
            .expect("query");
        assert_eq!(count, 2);
    }

    #[test]
    fn write_rolls_back_on_error() {
        let mut store = open_in_memory().expect("store");
        let result: Result<(), CoreError> = store.write(|tx| {
            tx.execute("INSERT INTO recipients (kind) VALUES ('release_notes');", [])?;
            Err(CoreError::InvalidArgument("boom".to_string()))
        });
        assert!(result.is_err());
        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM recipients;", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0);
    }
}
