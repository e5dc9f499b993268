//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the task list operations to Dart via FRB over an explicit
//!   session handle.
//! - Translate core errors into simple envelopes with user-facing messages.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Due-date strings without an offset are the user's local wall-clock time.
//! - Indices passed in are collection positions as reported by
//!   `visible_tasks`, never positions inside the filtered list.
//! - A session that cannot open its database keeps working in memory and
//!   reports `persistent() == false`.

use log::warn;
use std::sync::{Mutex, MutexGuard};
use tasklist_core::{
    core_version as core_version_inner, format_due_at, init_logging as init_logging_inner,
    parse_due_input, seed_tasks, DueAt, MemorySlotStore, SlotStore, SqliteSlotStore,
    StorageResult, SystemClock, TaskPersistence, TaskStore, TaskStoreError, TaskValidationError,
    ValidationCategory,
};

const TEXT_LENGTH_MESSAGE: &str = "Enter more than 3 and fewer than 255 characters.";
const DUE_DATE_MESSAGE: &str = "The due date must be empty or in the future.";
const INDEX_MESSAGE: &str = "That task no longer exists. Refresh the list and try again.";
const PERSISTENCE_MESSAGE: &str = "Saved for this session only; storage is unavailable.";

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Result envelope for mutating session calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether the operation succeeded and was saved.
    pub ok: bool,
    /// One of `""`, `text_length`, `due_date`, `index`, `persistence`.
    pub error_kind: String,
    /// User-facing message; empty on success.
    pub message: String,
}

impl TaskActionResponse {
    fn success() -> Self {
        Self {
            ok: true,
            error_kind: String::new(),
            message: String::new(),
        }
    }

    fn failure(error_kind: &str, message: &str) -> Self {
        Self {
            ok: false,
            error_kind: error_kind.to_string(),
            message: message.to_string(),
        }
    }

    fn from_validation(err: &TaskValidationError) -> Self {
        match err.category() {
            ValidationCategory::TextLength => Self::failure("text_length", TEXT_LENGTH_MESSAGE),
            ValidationCategory::DueDate => Self::failure("due_date", DUE_DATE_MESSAGE),
        }
    }

    fn from_store_error(err: &TaskStoreError) -> Self {
        match err {
            TaskStoreError::Validation(inner) => Self::from_validation(inner),
            TaskStoreError::IndexOutOfBounds { .. } => Self::failure("index", INDEX_MESSAGE),
            TaskStoreError::Persistence(_) => Self::failure("persistence", PERSISTENCE_MESSAGE),
        }
    }
}

/// One row of the rendered task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListItem {
    /// Collection position to pass back into edit/toggle/delete.
    pub index: u32,
    pub text: String,
    /// `text` with search matches wrapped in highlight markup.
    pub highlighted_text: String,
    /// ISO-8601 UTC due date, if any.
    pub due_at: Option<String>,
    pub completed: bool,
}

/// Slot backends a session can run on.
enum SessionSlots {
    Sqlite(SqliteSlotStore),
    Memory(MemorySlotStore),
}

impl SlotStore for SessionSlots {
    fn read_slot(&self, key: &str) -> StorageResult<Option<String>> {
        match self {
            Self::Sqlite(store) => store.read_slot(key),
            Self::Memory(store) => store.read_slot(key),
        }
    }

    fn write_slot(&mut self, key: &str, value: &str) -> StorageResult<()> {
        match self {
            Self::Sqlite(store) => store.write_slot(key, value),
            Self::Memory(store) => store.write_slot(key, value),
        }
    }

    fn clear_slot(&mut self, key: &str) -> StorageResult<()> {
        match self {
            Self::Sqlite(store) => store.clear_slot(key),
            Self::Memory(store) => store.clear_slot(key),
        }
    }
}

/// Task list handle owned by the UI for the lifetime of one session.
#[flutter_rust_bridge::frb(opaque)]
pub struct TaskSession {
    store: Mutex<TaskStore<SessionSlots>>,
    persistent: bool,
}

impl TaskSession {
    /// Opens the task list stored at `db_path`.
    ///
    /// # FFI contract
    /// - Sync call; opens and migrates the SQLite file.
    /// - Never fails: on any storage error the session starts from the seed
    ///   collection in memory.
    #[flutter_rust_bridge::frb(sync)]
    pub fn open(db_path: String) -> TaskSession {
        match open_persistent_store(db_path.trim()) {
            Ok(store) => Self::from_store(store, true),
            Err(err) => {
                warn!("event=session_open module=ffi status=degraded error={err}");
                Self::in_memory()
            }
        }
    }

    /// Opens a session that never touches disk.
    #[flutter_rust_bridge::frb(sync)]
    pub fn in_memory() -> TaskSession {
        let persistence = TaskPersistence::new(SessionSlots::Memory(MemorySlotStore::new()));
        let store = TaskStore::with_tasks(seed_tasks(), persistence, SystemClock);
        Self::from_store(store, false)
    }

    /// Whether changes are written to the database file.
    #[flutter_rust_bridge::frb(sync, getter)]
    pub fn persistent(&self) -> bool {
        self.persistent
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn create_task(&self, text: String, due: String) -> TaskActionResponse {
        let due_at = match parse_due(&due) {
            Ok(due_at) => due_at,
            Err(response) => return response,
        };
        respond(self.lock().create(&text, due_at))
    }

    /// Commits an inline edit of the task at `index`.
    #[flutter_rust_bridge::frb(sync)]
    pub fn commit_edit(&self, index: u32, text: String, due: String) -> TaskActionResponse {
        let due_at = match parse_due(&due) {
            Ok(due_at) => due_at,
            Err(response) => return response,
        };
        respond(self.lock().edit(index as usize, &text, due_at))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn toggle_complete(&self, index: u32) -> TaskActionResponse {
        respond(self.lock().toggle_complete(index as usize))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn delete_task(&self, index: u32) -> TaskActionResponse {
        respond(self.lock().delete(index as usize))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_search_term(&self, term: String) {
        self.lock().set_search_term(term);
    }

    /// Rows to render under the current search term.
    #[flutter_rust_bridge::frb(sync)]
    pub fn visible_tasks(&self) -> Vec<TaskListItem> {
        let store = self.lock();
        store
            .filtered_view()
            .into_iter()
            .map(|item| TaskListItem {
                index: item.index as u32,
                text: item.task.text.clone(),
                highlighted_text: store.highlight(&item.task.text),
                due_at: item.task.due_at.as_ref().map(format_due_at),
                completed: item.task.completed,
            })
            .collect()
    }

    fn from_store(store: TaskStore<SessionSlots>, persistent: bool) -> Self {
        Self {
            store: Mutex::new(store),
            persistent,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TaskStore<SessionSlots>> {
        // A poisoned lock still holds a consistent store: every mutation
        // validates before it writes.
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn open_persistent_store(db_path: &str) -> Result<TaskStore<SessionSlots>, String> {
    if db_path.is_empty() {
        return Err("db_path cannot be empty".to_string());
    }
    let slots = SqliteSlotStore::open(db_path).map_err(|err| err.to_string())?;
    TaskStore::open(TaskPersistence::new(SessionSlots::Sqlite(slots)))
        .map_err(|err| err.to_string())
}

fn parse_due(raw: &str) -> Result<Option<DueAt>, TaskActionResponse> {
    parse_due_input(raw).map_err(|err| TaskActionResponse::from_validation(&err))
}

fn respond<T>(result: Result<T, TaskStoreError>) -> TaskActionResponse {
    match result {
        Ok(_) => TaskActionResponse::success(),
        Err(err) => TaskActionResponse::from_store_error(&err),
    }
}
