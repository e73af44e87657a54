//! Storage layer for spacetime.
//!
//! Provides a small durable key-value store on top of `rusqlite` and uses it
//! to persist the [`DailyTotals`] document.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization. Tracking is single-threaded,
//! so nothing here locks.
//!
//! # Schema
//!
//! A single `state` table maps a TEXT key to a TEXT value holding JSON.
//! The per-workspace totals live under [`WORKSPACE_TIMES_KEY`] as
//! `{ "<workspace>": { "YYYY-MM-DD": <seconds> } }`.
//!
//! Entries that fail to decode (a `null` day value, a malformed date) are
//! skipped one at a time when loading, so the rest of the document survives
//! the next save.
//!
//! `updated_at` is stored in ISO 8601 (e.g., `2024-01-15T10:30:00Z`) and is
//! informational only.

use std::path::Path;

use chrono::{NaiveDate, SecondsFormat, Utc};
use indexmap::IndexMap;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use st_core::{DailyTotals, TotalsStore};
use thiserror::Error;

/// Key under which the per-workspace daily totals are stored.
pub const WORKSPACE_TIMES_KEY: &str = "workspaceTimes";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to encode a value before writing it.
    #[error("failed to encode value for {key}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Reads the raw value stored under `key`.
    pub fn get_state(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM state WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Writes `value` under `key`, replacing any previous value.
    pub fn set_state(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.conn.execute(
            "
            INSERT INTO state (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, now],
        )?;
        Ok(())
    }
}

impl TotalsStore for Database {
    type Error = StoreError;

    /// Loads the totals document.
    ///
    /// Missing, empty or unparseable state loads as an empty mapping.
    /// Individual entries that cannot be decoded are dropped with a warning.
    fn load_totals(&self) -> Result<DailyTotals, StoreError> {
        let Some(raw) = self.get_state(WORKSPACE_TIMES_KEY)? else {
            return Ok(DailyTotals::new());
        };
        if raw.trim().is_empty() {
            return Ok(DailyTotals::new());
        }
        match serde_json::from_str::<IndexMap<String, Value>>(&raw) {
            Ok(workspaces) => Ok(decode_totals(workspaces)),
            Err(e) => {
                tracing::warn!(error = %e, "stored workspace times are corrupt, starting empty");
                Ok(DailyTotals::new())
            }
        }
    }

    fn save_totals(&mut self, totals: &DailyTotals) -> Result<(), StoreError> {
        let raw = serde_json::to_string(totals).map_err(|source| StoreError::Encode {
            key: WORKSPACE_TIMES_KEY.to_string(),
            source,
        })?;
        self.set_state(WORKSPACE_TIMES_KEY, &raw)
    }
}

/// Builds totals from a loosely typed document, keeping every valid entry.
fn decode_totals(workspaces: IndexMap<String, Value>) -> DailyTotals {
    let mut totals = DailyTotals::new();
    for (workspace, days) in workspaces {
        let Value::Object(days) = days else {
            tracing::warn!(%workspace, "skipping workspace with non-object times");
            continue;
        };
        for (day, seconds) in days {
            let (Ok(date), Some(seconds)) = (day.parse::<NaiveDate>(), seconds.as_f64()) else {
                tracing::warn!(%workspace, %day, %seconds, "skipping unreadable time entry");
                continue;
            };
            totals.add(&workspace, date, seconds);
        }
    }
    totals
}
