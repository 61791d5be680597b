//! Repository pattern for database access.

use crate::db::error::DbError;
use chrono::Utc;
use quiz_core::{ProgressBook, ProgressSnapshot, PROGRESS_NAMESPACE};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

type Result<T> = std::result::Result<T, DbError>;

/// Raw namespaced storage.
pub trait KeyValueRepository {
    fn get_value(&self, key: &str) -> Result<Option<String>>;
    fn put_value(&self, key: &str, value: &str) -> Result<()>;
    fn delete_value(&self, key: &str) -> Result<bool>;
}

/// Per-learner progress snapshots stored as one [`ProgressBook`].
pub trait ProgressRepository {
    fn load_book(&self) -> Result<ProgressBook>;
    fn save_snapshot(&self, user_key: &str, snapshot: &ProgressSnapshot) -> Result<()>;
    fn load_snapshot(&self, user_key: &str) -> Result<Option<ProgressSnapshot>>;
}

/// SQLite implementation of all repository traits.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(super::schema::SCHEMA)?;
        self.conn.execute_batch(super::schema::INIT_SCHEMA_VERSION)?;
        Ok(())
    }

    pub fn schema_version(&self) -> Result<i32> {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

impl KeyValueRepository for SqliteRepository {
    fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    fn put_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete_value(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }
}

impl ProgressRepository for SqliteRepository {
    fn load_book(&self) -> Result<ProgressBook> {
        match self.get_value(PROGRESS_NAMESPACE)? {
            Some(raw) => Ok(ProgressBook::from_json(&raw)?),
            None => Ok(ProgressBook::new()),
        }
    }

    fn save_snapshot(&self, user_key: &str, snapshot: &ProgressSnapshot) -> Result<()> {
        let mut book = self.load_book()?;
        book.insert(user_key, snapshot.clone());
        self.put_value(PROGRESS_NAMESPACE, &book.to_json()?)
    }

    fn load_snapshot(&self, user_key: &str) -> Result<Option<ProgressSnapshot>> {
        Ok(self.load_book()?.read(user_key)?)
    }
}
