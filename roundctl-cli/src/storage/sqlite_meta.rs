use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::debug;

use roundctl_core::error::RoundCtlError;
use roundctl_core::traits::storage::PersistentStorage;

/// Persistent key-value metadata storage backed by SQLite.
///
/// Uses a single `metadata(key TEXT PRIMARY KEY, value BLOB)` table.
/// Synchronous rusqlite calls are wrapped in `tokio::task::spawn_blocking`.
pub struct SqliteMeta {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMeta {
    /// Open (or create) the SQLite database at the given path, creating
    /// missing parent directories.
    pub fn open(db_path: &Path) -> Result<Self, RoundCtlError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RoundCtlError::Storage(format!("create state dir failed: {e}")))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| RoundCtlError::Storage(format!("open SQLite DB failed: {e}")))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS metadata (
                key   TEXT PRIMARY KEY,
                value BLOB NOT NULL
            )",
            [],
        )
        .map_err(|e| RoundCtlError::Storage(format!("create metadata table failed: {e}")))?;

        debug!("Opened SQLite metadata DB at {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, discarded on drop.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, RoundCtlError> {
        Self::open(Path::new(":memory:"))
    }
}

#[async_trait(?Send)]
impl PersistentStorage for SqliteMeta {
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), RoundCtlError> {
        let conn = self.conn.clone();
        let key = key.to_string();
        let value = value.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
                rusqlite::params![key, value],
            )
            .map_err(|e| RoundCtlError::Storage(format!("sqlite set failed: {e}")))?;

            debug!("Set key '{}' ({} bytes)", key, value.len());
            Ok(())
        })
        .await
        .map_err(|e| RoundCtlError::Storage(format!("spawn_blocking failed: {e}")))?
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RoundCtlError> {
        let conn = self.conn.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare("SELECT value FROM metadata WHERE key = ?1")
                .map_err(|e| RoundCtlError::Storage(format!("sqlite prepare failed: {e}")))?;

            let result: Result<Vec<u8>, _> =
                stmt.query_row(rusqlite::params![key], |row| row.get(0));

            match result {
                Ok(value) => {
                    debug!("Got key '{}' ({} bytes)", key, value.len());
                    Ok(Some(value))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    debug!("Key '{}' not found", key);
                    Ok(None)
                }
                Err(e) => Err(RoundCtlError::Storage(format!("sqlite get failed: {e}"))),
            }
        })
        .await
        .map_err(|e| RoundCtlError::Storage(format!("spawn_blocking failed: {e}")))?
    }

    async fn delete(&self, key: &str) -> Result<(), RoundCtlError> {
        let conn = self.conn.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute("DELETE FROM metadata WHERE key = ?1", rusqlite::params![key])
                .map_err(|e| RoundCtlError::Storage(format!("sqlite delete failed: {e}")))?;

            debug!("Deleted key '{}'", key);
            Ok(())
        })
        .await
        .map_err(|e| RoundCtlError::Storage(format!("spawn_blocking failed: {e}")))?
    }
}
