//! Local key-value storage backed by SQLite.
//!
//! Values are opaque strings stored under fixed keys and always replaced
//! wholesale; there is no partial update or schema versioning.

use anyhow::{anyhow, Result};
use rusqlite::OptionalExtension;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// String values keyed by name in a single SQLite table.
pub struct KeyValueStore {
    /// Path to the SQLite database file
    database_path: PathBuf,
    /// Connection to the database (lazy-loaded)
    connection: Option<Connection>,
}

impl KeyValueStore {
    /// Creates a store for the given data directory. The database is opened on first use.
    ///
    /// # Errors
    /// - If the data directory cannot be created
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        Ok(Self {
            database_path: data_dir.join("clipdeck.db"),
            connection: None,
        })
    }

    /// Opens the database connection and creates the table if necessary.
    ///
    /// # Errors
    /// - If the database file cannot be opened
    /// - If table creation fails
    fn get_connection(&mut self) -> Result<&Connection> {
        if self.connection.is_none() {
            let connection = Connection::open(&self.database_path)?;

            connection.execute(
                "CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                [],
            )?;

            tracing::debug!("Opened storage at {}", self.database_path.display());
            self.connection = Some(connection);
        }

        self.connection
            .as_ref()
            .ok_or_else(|| anyhow!("Storage connection unavailable"))
    }

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If the query fails
    pub fn get(&mut self, key: &str) -> Result<Option<String>> {
        let connection = self.get_connection()?;
        let value = connection
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Replaces the value stored under `key`.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If the write fails
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let connection = self.get_connection()?;
        let timestamp = chrono::Local::now().to_rfc3339();
        connection.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, timestamp],
        )?;
        tracing::trace!("Stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = KeyValueStore::new(dir.path()).unwrap();
        assert_eq!(store.get("recordings").unwrap(), None);
    }

    #[test]
    fn test_set_replaces_value_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = KeyValueStore::new(dir.path()).unwrap();
            store.set("recordings", "[1]").unwrap();
            store.set("recordings", "[2]").unwrap();
        }
        let mut reopened = KeyValueStore::new(dir.path()).unwrap();
        assert_eq!(reopened.get("recordings").unwrap().as_deref(), Some("[2]"));
    }
}
