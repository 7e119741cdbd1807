//! SQLite hint store.
//!
//! Hints live in one `hints` table, ordered by their autoincrement id.
//! Key patterns arrive in store form and are applied with
//! `LIKE ?1 ESCAPE '\'` on a case-sensitive connection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::Value;

use crate::blackboard::hint::{Hint, HintDraft};
use crate::memory::storage::interface::HintStore;
use crate::utilities::config::FleetConfig;
use crate::utilities::errors::StoreError;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS hints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    ttl INTEGER,
    created_at INTEGER NOT NULL,
    expires_at INTEGER
)";

const CREATE_KEY_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_hints_key ON hints (key)";

/// Persistent hint store backed by a SQLite file.
///
/// Each call opens its own connection on a blocking worker, so the store
/// can be shared freely across tasks.
#[derive(Debug, Clone)]
pub struct SqliteHintStore {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

impl SqliteHintStore {
    /// Open (or create) the hint database.
    ///
    /// # Arguments
    /// * `db_path` - Optional path to the database file. Defaults to
    ///   `<db_storage_path>/fleet_hints.db`.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.unwrap_or_else(crate::utilities::paths::default_hint_db_path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = open(&db_path)?;
        conn.execute(CREATE_TABLE, [])?;
        conn.execute(CREATE_KEY_INDEX, [])?;
        log::debug!("Hint store ready at {}", db_path.display());

        Ok(Self { db_path })
    }

    /// Open the database named by `config`.
    pub fn from_config(config: &FleetConfig) -> Result<Self, StoreError> {
        Self::new(Some(config.resolved_hint_db_path()))
    }

    /// Delete expired rows. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now_ms = Utc::now().timestamp_millis();
        self.with_connection(move |conn| {
            let removed = conn.execute(
                "DELETE FROM hints WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now_ms],
            )?;
            if removed > 0 {
                log::debug!("Purged {} expired hints", removed);
            }
            Ok(removed)
        })
        .await
    }

    /// Total rows, expired ones included until purged.
    pub async fn count(&self) -> Result<usize, StoreError> {
        self.with_connection(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM hints", [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or(0))
        })
        .await
    }

    /// Remove every hint.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM hints", [])?;
            Ok(())
        })
        .await
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = open(&db_path)?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl HintStore for SqliteHintStore {
    async fn post(&self, hint: &HintDraft) -> Result<(), StoreError> {
        StoreError::check_key(&hint.key)?;
        let hint = hint.materialize(Utc::now());
        let value = serde_json::to_string(&hint.value)?;
        let ttl = hint.ttl.map(|t| i64::try_from(t).unwrap_or(i64::MAX));
        let created_at = hint.created_at.timestamp_millis();
        let expires_at = hint.expires_at.map(|at| at.timestamp_millis());
        let key = hint.key;

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO hints (key, value, ttl, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![key, value, ttl, created_at, expires_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn query(&self, store_pattern: &str) -> Result<Vec<Hint>, StoreError> {
        let pattern = store_pattern.to_string();
        let now_ms = Utc::now().timestamp_millis();

        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key, value, ttl, created_at, expires_at
                 FROM hints
                 WHERE key LIKE ?1 ESCAPE '\\'
                   AND (expires_at IS NULL OR expires_at > ?2)
                 ORDER BY id ASC",
            )?;

            let rows = stmt.query_map(params![pattern, now_ms], |row| {
                let key: String = row.get(0)?;
                let value: String = row.get(1)?;
                let ttl: Option<i64> = row.get(2)?;
                let created_at: i64 = row.get(3)?;
                let expires_at: Option<i64> = row.get(4)?;
                Ok((key, value, ttl, created_at, expires_at))
            })?;

            let mut hints = Vec::new();
            for row in rows {
                let (key, value, ttl, created_at, expires_at) = row?;
                let value: Value = serde_json::from_str(&value)?;
                hints.push(Hint {
                    key,
                    value,
                    ttl: ttl.and_then(|t| u64::try_from(t).ok()),
                    created_at: from_millis(created_at)?,
                    expires_at: expires_at.map(from_millis).transpose()?,
                });
            }
            Ok(hints)
        })
        .await
    }
}

fn open(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path).map_err(|e| {
        log::error!(
            "HINT STORE ERROR: could not open database at {}: {}",
            path.display(),
            e
        );
        e
    })?;
    conn.pragma_update(None, "case_sensitive_like", true)?;
    Ok(conn)
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::backend(format!("invalid hint timestamp {}", ms)))
}
