use chrono::Utc;
use duckdb::{params, Connection, OptionalExt};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures of the durable record. Never shown to the user; callers degrade
/// to an empty history.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend: {0}")]
    Backend(#[from] duckdb::Error),

    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
}

// ── Store trait ───────────────────────────────────────────────────────────────

/// Swappable durable key-value record (one serialized blob per key).
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

// ── Schema ────────────────────────────────────────────────────────────────────

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key         VARCHAR PRIMARY KEY,
    value       VARCHAR NOT NULL,
    updated_at  TIMESTAMP NOT NULL
);
"#;

// ── DuckDB repository ─────────────────────────────────────────────────────────

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!("Opened DuckDB at {:?}", path);
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn run_migrations(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(DDL)?;
        info!("Storage schema ready");
        Ok(())
    }

    #[cfg(test)]
    pub fn key_count(&self) -> Result<i64, StorageError> {
        let mut s = self.conn.prepare("SELECT COUNT(*) FROM kv_store")?;
        Ok(s.query_row([], |r| r.get(0))?)
    }
}

impl KeyValueStore for Repository {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv_store WHERE key = ?")?;
        let value: Option<String> = stmt.query_row(params![key], |r| r.get(0)).optional()?;
        Ok(value)
    }

    /// Upsert — the whole record is replaced.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            r#"INSERT INTO kv_store (key, value, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT (key) DO UPDATE SET
                   value      = excluded.value,
                   updated_at = excluded.updated_at"#,
            params![key, value, Utc::now().naive_utc()],
        )?;
        Ok(())
    }
}

// ── In-memory store ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}
