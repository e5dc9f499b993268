//! Task list use-case service.
//!
//! # Responsibility
//! - Own the ordered task collection and the current search term for one
//!   session.
//! - Validate create/edit input, apply positional mutations, and persist the
//!   full collection after each one.
//! - Produce the filtered view and highlighted text for presentation.
//!
//! # Invariants
//! - Validation and bounds errors are raised before any mutation.
//! - `now` is read once per operation.
//! - A failed save keeps the in-memory mutation and marks the session as
//!   having unsaved changes; the next successful save clears the mark.
//! - The search term is never persisted.

use crate::clock::{Clock, SystemClock};
use crate::model::due::DueAt;
use crate::model::task::{normalize_text, validate_due_at, Task, TaskValidationError};
use crate::repo::slot_repo::SlotStore;
use crate::repo::task_persistence::{PersistenceError, PersistenceResult, TaskPersistence};
use crate::search::term::{HighlightMarker, SearchTerm};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, TaskStoreError>;

/// Error returned by task store operations.
#[derive(Debug)]
pub enum TaskStoreError {
    /// Input broke a text-length or due-date rule; nothing changed.
    Validation(TaskValidationError),
    /// Position outside `0..len`; nothing changed.
    IndexOutOfBounds { index: usize, len: usize },
    /// The mutation was applied in memory but could not be saved.
    Persistence(PersistenceError),
}

impl TaskStoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Self::IndexOutOfBounds { .. })
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl Display for TaskStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "task index {index} out of bounds for {len} task(s)")
            }
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::IndexOutOfBounds { .. } => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for TaskStoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistenceError> for TaskStoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// A task visible under the current search term.
///
/// `index` is the position in the full collection, which is what
/// `edit`/`toggle_complete`/`delete` expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleTask<'a> {
    pub index: usize,
    pub task: &'a Task,
}

/// In-memory task list bound to one persistence slot.
pub struct TaskStore<S: SlotStore, C: Clock = SystemClock> {
    tasks: Vec<Task>,
    search: SearchTerm,
    persistence: TaskPersistence<S>,
    clock: C,
    unsaved: bool,
}

impl<S: SlotStore> TaskStore<S, SystemClock> {
    /// Hydrates a store from persistence using the wall clock.
    pub fn open(persistence: TaskPersistence<S>) -> PersistenceResult<Self> {
        Self::open_with_clock(persistence, SystemClock)
    }
}

impl<S: SlotStore, C: Clock> TaskStore<S, C> {
    /// Hydrates a store from persistence (seed on first run).
    ///
    /// # Errors
    /// - `PersistenceError` when the slot cannot be read at all.
    pub fn open_with_clock(persistence: TaskPersistence<S>, clock: C) -> PersistenceResult<Self> {
        let tasks = persistence.load()?;
        info!(
            "event=store_open module=store status=ok count={}",
            tasks.len()
        );
        Ok(Self::with_tasks(tasks, persistence, clock))
    }

    /// Builds a store around an already loaded collection without reading
    /// storage. Nothing is saved until the first mutation.
    pub fn with_tasks(tasks: Vec<Task>, persistence: TaskPersistence<S>, clock: C) -> Self {
        Self {
            tasks,
            search: SearchTerm::default(),
            persistence,
            clock,
            unsaved: false,
        }
    }

    /// Appends a new open task.
    ///
    /// # Errors
    /// - `Validation` for text outside the length bounds or a due date that is
    ///   not in the future. The collection is unchanged.
    /// - `Persistence` when saving fails; the task stays appended.
    pub fn create(&mut self, text: &str, due_at: Option<DueAt>) -> StoreResult<()> {
        let now = self.clock.now();
        let task = Task::validated(text, due_at, now).map_err(|err| reject("task_create", err))?;

        self.tasks.push(task);
        info!(
            "event=task_create module=store status=ok index={} has_due={}",
            self.tasks.len() - 1,
            due_at.is_some()
        );
        self.persist("task_create")
    }

    /// Replaces text and due date of the task at `index`; `completed` is kept.
    ///
    /// This is the explicit "commit edit" call for inline editors.
    ///
    /// # Errors
    /// - `IndexOutOfBounds`, then `Validation`, both before any mutation.
    /// - `Persistence` when saving fails; the edit stays applied.
    pub fn edit(&mut self, index: usize, text: &str, due_at: Option<DueAt>) -> StoreResult<()> {
        self.check_index(index)?;
        let now = self.clock.now();
        let text = normalize_text(text).map_err(|err| reject("task_edit", err))?;
        validate_due_at(due_at, now).map_err(|err| reject("task_edit", err))?;

        let task = &mut self.tasks[index];
        task.text = text;
        task.due_at = due_at;
        info!(
            "event=task_edit module=store status=ok index={index} has_due={}",
            due_at.is_some()
        );
        self.persist("task_edit")
    }

    /// Flips `completed` at `index` and returns the new value.
    pub fn toggle_complete(&mut self, index: usize) -> StoreResult<bool> {
        self.check_index(index)?;
        let completed = self.tasks[index].toggle_completed();
        info!("event=task_toggle module=store status=ok index={index} completed={completed}");
        self.persist("task_toggle")?;
        Ok(completed)
    }

    /// Removes and returns the task at `index`; later positions shift down.
    pub fn delete(&mut self, index: usize) -> StoreResult<Task> {
        self.check_index(index)?;
        let removed = self.tasks.remove(index);
        info!(
            "event=task_delete module=store status=ok index={index} remaining={}",
            self.tasks.len()
        );
        self.persist("task_delete")?;
        Ok(removed)
    }

    /// Replaces the search term. Accepts any string; not persisted.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search = SearchTerm::new(term);
    }

    pub fn search_term(&self) -> &str {
        self.search.as_str()
    }

    /// Tasks matching the current search term, in collection order.
    pub fn filtered_view(&self) -> Vec<VisibleTask<'_>> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| self.search.matches(&task.text))
            .map(|(index, task)| VisibleTask { index, task })
            .collect()
    }

    /// Wraps current-term matches in `text` with the default marker.
    pub fn highlight(&self, text: &str) -> String {
        self.search.highlight(text)
    }

    pub fn highlight_with(&self, text: &str, marker: &HighlightMarker) -> String {
        self.search.highlight_with(text, marker)
    }

    /// Saves the collection again, e.g. after an earlier save failed.
    pub fn flush(&mut self) -> StoreResult<()> {
        self.persist("store_flush")
    }

    /// Whether the last save failed and memory is ahead of storage.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn persistence(&self) -> &TaskPersistence<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut TaskPersistence<S> {
        &mut self.persistence
    }

    fn check_index(&self, index: usize) -> StoreResult<()> {
        let len = self.tasks.len();
        if index >= len {
            warn!("event=task_lookup module=store status=rejected error_code=index_out_of_bounds index={index} len={len}");
            return Err(TaskStoreError::IndexOutOfBounds { index, len });
        }
        Ok(())
    }

    fn persist(&mut self, event: &'static str) -> StoreResult<()> {
        match self.persistence.save(&self.tasks) {
            Ok(()) => {
                self.unsaved = false;
                Ok(())
            }
            Err(err) => {
                self.unsaved = true;
                error!("event={event} module=store status=unsaved error_code=persist_failed error={err}");
                Err(err.into())
            }
        }
    }
}

fn reject(event: &'static str, err: TaskValidationError) -> TaskValidationError {
    warn!(
        "event={event} module=store status=rejected error_code={}",
        err.code()
    );
    err
}

#[cfg(test)]
mod tests {
    use super::TaskStore;
    use crate::clock::FixedClock;
    use crate::repo::slot_repo::MemorySlotStore;
    use crate::repo::task_persistence::TaskPersistence;
    use chrono::{TimeZone, Utc};

    fn store(clock: &FixedClock) -> TaskStore<MemorySlotStore, &FixedClock> {
        TaskStore::open_with_clock(TaskPersistence::new(MemorySlotStore::new()), clock).unwrap()
    }

    #[test]
    fn fresh_store_starts_from_seed_with_empty_term() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        let store = store(&clock);
        assert_eq!(store.len(), 2);
        assert_eq!(store.search_term(), "");
        assert!(!store.has_unsaved_changes());
    }

    #[test]
    fn filtered_view_reports_collection_indices() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        let mut store = store(&clock);
        store.create("Water plants", None).unwrap();
        store.set_search_term("plants");

        let view = store.filtered_view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].index, 2);
        assert_eq!(view[0].task.text, "Water plants");
    }

    #[test]
    fn edit_checks_bounds_before_text() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        let mut store = store(&clock);
        let err = store.edit(9, "x", None).unwrap_err();
        assert!(err.is_index());
    }
}
