//! Core task-list logic.
//! This crate is the single source of truth for task invariants; presentation
//! layers call into `TaskStore` and render from its views.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{init_logging, logging_status, LoggingError};
pub use model::due::{
    format_due_at, parse_due_at, parse_due_at_in, parse_due_input, parse_due_input_in, DueAt,
};
pub use model::task::{
    Task, TaskValidationError, ValidationCategory, TEXT_MAX_EXCLUSIVE, TEXT_MIN_EXCLUSIVE,
};
pub use repo::slot_repo::{
    MemorySlotStore, SlotStore, SqliteSlotStore, StorageError, StorageResult,
};
pub use repo::task_persistence::{
    seed_tasks, PersistenceError, PersistenceResult, TaskPersistence, TASKS_SLOT_KEY,
};
pub use search::term::{HighlightMarker, SearchTerm, MIN_TERM_CHARS};
pub use service::task_store::{StoreResult, TaskStore, TaskStoreError, VisibleTask};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
