//! SQLite backend: one row per key, upserted on every write.

use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use perfscope_core::errors::StorageError;
use rusqlite::{params, Connection};
use serde_json::Value;

use crate::backend::{Entries, PersistenceBackend};

const SCHEMA_VERSION: i64 = 1;

const MIGRATION_V001: &str = "
    CREATE TABLE IF NOT EXISTS kv_entries (
        namespace  TEXT NOT NULL,
        key        TEXT NOT NULL,
        value_json TEXT NOT NULL,
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (namespace, key)
    ) STRICT;
";

fn to_storage_err(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError { message: e.to_string() }
}

#[derive(Debug)]
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Io {
                path: parent.display().to_string(),
                message: e.to_string(),
            })?;
        }
        let conn = Connection::open(path).map_err(to_storage_err)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )
        .map_err(to_storage_err)?;
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::initialize(Connection::open_in_memory().map_err(to_storage_err)?)
    }

    fn initialize(conn: Connection) -> Result<Self, StorageError> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StorageError::LockPoisoned("sqlite connection".to_string()))?;
        f(&conn)
    }

    pub fn schema_version(&self) -> Result<i64, StorageError> {
        self.with_conn(user_version)
    }
}

fn user_version(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(to_storage_err)
}

fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current = user_version(conn)?;
    if current >= SCHEMA_VERSION {
        return Ok(());
    }
    conn.execute_batch(MIGRATION_V001).map_err(to_storage_err)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(to_storage_err)?;
    tracing::debug!(from = current, to = SCHEMA_VERSION, "sqlite store migrated");
    Ok(())
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

impl PersistenceBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn load(&self) -> Result<Entries, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT namespace, key, value_json FROM kv_entries")
                .map_err(to_storage_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })
                .map_err(to_storage_err)?;

            let mut entries = Entries::new();
            for row in rows {
                let (namespace, key, json) = row.map_err(to_storage_err)?;
                let value: Value = serde_json::from_str(&json).map_err(|e| StorageError::Serialization {
                    message: format!("{namespace}/{key}: {e}"),
                })?;
                entries.entry(namespace).or_default().insert(key, value);
            }
            Ok(entries)
        })
    }

    fn write(&self, namespace: &str, key: &str, value: Option<&Value>, _snapshot: &Entries) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            match value {
                Some(value) => {
                    let json = serde_json::to_string(value)
                        .map_err(|e| StorageError::Serialization { message: e.to_string() })?;
                    conn.execute(
                        "INSERT INTO kv_entries (namespace, key, value_json, updated_at)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(namespace, key) DO UPDATE SET
                             value_json = excluded.value_json,
                             updated_at = excluded.updated_at",
                        params![namespace, key, json, now_secs()],
                    )
                    .map_err(to_storage_err)?;
                }
                None => {
                    conn.execute(
                        "DELETE FROM kv_entries WHERE namespace = ?1 AND key = ?2",
                        params![namespace, key],
                    )
                    .map_err(to_storage_err)?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn migration_is_applied_once() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        assert_eq!(backend.schema_version().unwrap(), SCHEMA_VERSION);
        backend.with_conn(run_migrations).unwrap();
        assert_eq!(backend.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn upsert_and_delete() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let empty = Entries::new();
        backend.write("ns", "k", Some(&json!(1)), &empty).unwrap();
        backend.write("ns", "k", Some(&json!(2)), &empty).unwrap();
        assert_eq!(backend.load().unwrap()["ns"]["k"], json!(2));

        backend.write("ns", "k", None, &empty).unwrap();
        assert!(backend.load().unwrap().is_empty());
    }
}
