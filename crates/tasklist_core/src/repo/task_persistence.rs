//! Task collection persistence over a key-value slot.
//!
//! # Responsibility
//! - Serialize the whole task collection into one slot and read it back.
//! - Supply the two-task seed collection when nothing usable is stored.
//!
//! # Invariants
//! - `load(save(tasks)) == tasks` for every collection.
//! - Stored tasks are returned verbatim; no re-validation on load.
//! - Storage failures surface as `PersistenceError`, never silently dropped.
//! - An unreadable payload falls back to the seed and is left in place until
//!   the next save overwrites it.

use crate::model::task::Task;
use crate::repo::slot_repo::{SlotStore, StorageError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Slot key holding the serialized task list. Must stay stable across releases.
pub const TASKS_SLOT_KEY: &str = "tasks";

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug)]
pub enum PersistenceError {
    Storage(StorageError),
    Encode(serde_json::Error),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "task persistence failed: {err}"),
            Self::Encode(err) => write!(f, "task list could not be encoded: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<StorageError> for PersistenceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Collection returned on first run or when the stored payload is unusable.
pub fn seed_tasks() -> Vec<Task> {
    vec![Task::new("Task 1"), Task::new("Task 2")]
}

/// Encodes tasks into the persisted JSON array.
pub fn encode_tasks(tasks: &[Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string(tasks)
}

/// Decodes the persisted JSON array.
pub fn decode_tasks(raw: &str) -> Result<Vec<Task>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Load/save adapter binding the task list to one slot of a `SlotStore`.
pub struct TaskPersistence<S: SlotStore> {
    store: S,
    key: String,
}

impl<S: SlotStore> TaskPersistence<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, TASKS_SLOT_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Reads the stored collection.
    ///
    /// Returns the seed collection when the slot is absent, blank, or holds a
    /// payload that does not decode as a task list.
    ///
    /// # Errors
    /// - `PersistenceError::Storage` when the slot itself cannot be read.
    pub fn load(&self) -> PersistenceResult<Vec<Task>> {
        let Some(raw) = self.store.read_slot(&self.key)? else {
            info!("event=tasks_load module=persistence status=seeded reason=absent");
            return Ok(seed_tasks());
        };

        if raw.trim().is_empty() {
            info!("event=tasks_load module=persistence status=seeded reason=blank");
            return Ok(seed_tasks());
        }

        match decode_tasks(&raw) {
            Ok(tasks) => {
                info!(
                    "event=tasks_load module=persistence status=ok count={}",
                    tasks.len()
                );
                Ok(tasks)
            }
            Err(err) => {
                warn!(
                    "event=tasks_load module=persistence status=seeded reason=unreadable payload_len={} error={err}",
                    raw.len()
                );
                Ok(seed_tasks())
            }
        }
    }

    /// Overwrites the slot with the full collection.
    pub fn save(&mut self, tasks: &[Task]) -> PersistenceResult<()> {
        let payload = encode_tasks(tasks).map_err(PersistenceError::Encode)?;
        self.store.write_slot(&self.key, &payload)?;
        info!(
            "event=tasks_save module=persistence status=ok count={} payload_len={}",
            tasks.len(),
            payload.len()
        );
        Ok(())
    }

    /// Clears the slot so the next `load` returns the seed.
    pub fn reset(&mut self) -> PersistenceResult<()> {
        self.store.clear_slot(&self.key)?;
        info!("event=tasks_reset module=persistence status=ok");
        Ok(())
    }
}
