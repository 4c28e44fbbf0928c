use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

use dwdx_core::{EntryMeta, StateStore, StateValue};

/// Entries in a single `states` table; meta and value are JSON text
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS states (
                path TEXT PRIMARY KEY,
                meta TEXT NOT NULL,
                value TEXT
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("sqlite connection poisoned"))
    }
}

#[async_trait::async_trait]
impl StateStore for SqliteStore {
    async fn exists(&self, path: &str) -> Result<bool> {
        let found = self
            .conn()?
            .query_row("SELECT 1 FROM states WHERE path = ?1", params![path], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    async fn create(&self, path: &str, meta: &EntryMeta) -> Result<()> {
        let meta = serde_json::to_string(meta)?;
        self.conn()?.execute(
            "INSERT OR IGNORE INTO states (path, meta, value) VALUES (?1, ?2, NULL)",
            params![path, meta],
        )?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<StateValue>> {
        let raw: Option<Option<String>> = self
            .conn()?
            .query_row(
                "SELECT value FROM states WHERE path = ?1",
                params![path],
                |r| r.get(0),
            )
            .optional()?;
        match raw.flatten() {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, path: &str, value: &StateValue) -> Result<()> {
        let value = serde_json::to_string(value)?;
        let changed = self.conn()?.execute(
            "UPDATE states SET value = ?2 WHERE path = ?1",
            params![path, value],
        )?;
        if changed == 0 {
            return Err(anyhow!("no entry at {}", path));
        }
        Ok(())
    }
}
