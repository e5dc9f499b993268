//! Key-value slot storage.
//!
//! # Responsibility
//! - Provide the durable "one key, one string value" substrate the task list
//!   is persisted into.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - `write_slot` replaces the whole value for a key in one statement.
//! - Reads of a key never written return `None`, not an empty string.

use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of the underlying slot storage.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Storage refused the operation (disabled, quota exceeded, missing schema).
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "slot storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable string slots addressed by key.
pub trait SlotStore {
    fn read_slot(&self, key: &str) -> StorageResult<Option<String>>;
    fn write_slot(&mut self, key: &str, value: &str) -> StorageResult<()>;
    fn clear_slot(&mut self, key: &str) -> StorageResult<()>;
}

/// SQLite-backed slot store over the `kv_slots` table.
pub struct SqliteSlotStore {
    conn: Connection,
}

impl SqliteSlotStore {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `StorageError::Unavailable` when the `kv_slots` table is missing,
    ///   i.e. the connection did not come from `open_db*`.
    pub fn try_new(conn: Connection) -> StorageResult<Self> {
        let has_table: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_slots'
            );",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Err(StorageError::Unavailable(
                "kv_slots table is missing; open the database with open_db".to_string(),
            ));
        }

        Ok(Self { conn })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a fresh in-memory database and wraps it.
    pub fn in_memory() -> StorageResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SlotStore for SqliteSlotStore {
    fn read_slot(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_slot(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_slots (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn clear_slot(&mut self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv_slots WHERE key = ?1;", params![key])?;
        Ok(())
    }
}

/// Process-local slot store; contents vanish with the value.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: HashMap<String, String>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn read_slot(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn write_slot(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear_slot(&mut self, key: &str) -> StorageResult<()> {
        self.slots.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySlotStore, SlotStore, SqliteSlotStore, StorageError};
    use rusqlite::Connection;

    #[test]
    fn sqlite_slot_overwrites_existing_value() {
        let mut store = SqliteSlotStore::in_memory().unwrap();
        assert_eq!(store.read_slot("tasks").unwrap(), None);

        store.write_slot("tasks", "[1]").unwrap();
        store.write_slot("tasks", "[2]").unwrap();
        assert_eq!(store.read_slot("tasks").unwrap().as_deref(), Some("[2]"));

        let rows: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM kv_slots;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn sqlite_clear_slot_removes_value() {
        let mut store = SqliteSlotStore::in_memory().unwrap();
        store.write_slot("tasks", "[]").unwrap();
        store.clear_slot("tasks").unwrap();
        assert_eq!(store.read_slot("tasks").unwrap(), None);
    }

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteSlotStore::try_new(conn).err().unwrap();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[test]
    fn memory_slots_are_independent_per_key() {
        let mut store = MemorySlotStore::new();
        store.write_slot("a", "1").unwrap();
        store.write_slot("b", "2").unwrap();
        store.clear_slot("a").unwrap();
        assert_eq!(store.read_slot("a").unwrap(), None);
        assert_eq!(store.read_slot("b").unwrap().as_deref(), Some("2"));
    }
}
