//! SQLite-backed preference cache.
//!
//! One table, one row: the serialized `UserPreferences` object. Read
//! once at startup and merged into defaults; written on every change.
//! Malformed stored data is discarded in favour of defaults rather than
//! surfaced as an error.

use crate::error::SessionError;
use dialer_types::{PreferencesPatch, UserPreferences};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;

/// Row key for the single preference entry.
const PREFS_KEY: &str = "user_preferences";

/// Durable local storage for user preferences.
#[derive(Debug)]
pub struct PreferenceStore {
    conn: Mutex<Connection>,
}

impl PreferenceStore {
    /// Opens (creating if needed) the preference cache at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory cache. Used by tests and by hosts that opt
    /// out of persistence.
    pub fn open_in_memory() -> Result<Self, SessionError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, SessionError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value_json TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Loads the stored preferences, merged into defaults.
    ///
    /// A missing row yields the defaults. Stored JSON is parsed as a
    /// partial patch so a row written by an older version (or a corrupt
    /// one) degrades field-wise instead of failing the load.
    pub fn load(&self) -> UserPreferences {
        let defaults = UserPreferences::default();
        let stored = match self.read_row() {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "failed to read preference cache, using defaults");
                return defaults;
            }
        };

        let Some(json) = stored else {
            return defaults;
        };

        match serde_json::from_str::<PreferencesPatch>(&json) {
            Ok(patch) => defaults.merge(&patch),
            Err(e) => {
                warn!(error = %e, "malformed stored preferences, using defaults");
                defaults
            }
        }
    }

    /// Writes the preferences, replacing any previous entry.
    pub fn save(&self, prefs: &UserPreferences) -> Result<(), SessionError> {
        let json = serde_json::to_string(prefs)?;
        let conn = self.conn.lock().expect("preference store lock poisoned");
        conn.execute(
            "INSERT INTO preferences (key, value_json) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
            params![PREFS_KEY, json],
        )?;
        Ok(())
    }

    fn read_row(&self) -> Result<Option<String>, SessionError> {
        let conn = self.conn.lock().expect("preference store lock poisoned");
        let row = conn
            .query_row(
                "SELECT value_json FROM preferences WHERE key = ?1",
                [PREFS_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row)
    }
}
