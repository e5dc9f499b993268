use chrono::{DateTime, Duration, TimeZone, Utc};
use tasklist_core::{
    FixedClock, MemorySlotStore, PersistenceError, SlotStore, StorageError, StorageResult, Task,
    TaskPersistence, TaskStore, TaskStoreError, TaskValidationError, ValidationCategory,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 3, 14, 9, 0, 0).unwrap()
}

fn empty_store(clock: &FixedClock) -> TaskStore<MemorySlotStore, &FixedClock> {
    let mut slots = MemorySlotStore::new();
    slots.write_slot("tasks", "[]").unwrap();
    TaskStore::open_with_clock(TaskPersistence::new(slots), clock).unwrap()
}

fn texts<S: SlotStore>(store: &TaskStore<S, &FixedClock>) -> Vec<String> {
    store.tasks().iter().map(|task| task.text.clone()).collect()
}

fn persisted(store: &TaskStore<MemorySlotStore, &FixedClock>) -> Vec<Task> {
    store.persistence().load().unwrap()
}

/// Slot store whose writes can be switched off to simulate quota errors.
#[derive(Default)]
struct FlakySlotStore {
    inner: MemorySlotStore,
    fail_writes: bool,
}

impl SlotStore for FlakySlotStore {
    fn read_slot(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.read_slot(key)
    }

    fn write_slot(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.write_slot(key, value)
    }

    fn clear_slot(&mut self, key: &str) -> StorageResult<()> {
        self.inner.clear_slot(key)
    }
}

struct UnreadableSlotStore;

impl SlotStore for UnreadableSlotStore {
    fn read_slot(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn write_slot(&mut self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn clear_slot(&mut self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }
}

#[test]
fn create_rejects_text_outside_length_bounds() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);

    let cases = [
        String::new(),
        "abc".to_string(),
        "   abc   ".to_string(),
        "a".repeat(255),
        format!("  {}  ", "b".repeat(300)),
    ];
    for text in cases {
        let err = store.create(&text, None).unwrap_err();
        match err {
            TaskStoreError::Validation(inner) => {
                assert_eq!(inner.category(), ValidationCategory::TextLength)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    assert!(store.is_empty());
    assert!(persisted(&store).is_empty());
}

#[test]
fn create_accepts_boundary_lengths_and_appends_open_task() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);

    store.create("abcd", None).unwrap();
    store.create(&"z".repeat(254), None).unwrap();
    store.create("  Buy milk  ", None).unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(store.tasks()[2], Task::new("Buy milk"));
    assert!(store.tasks().iter().all(|task| !task.completed));
    assert_eq!(persisted(&store), store.tasks());
}

#[test]
fn create_requires_due_date_strictly_in_future() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);

    for due_at in [start(), start() - Duration::days(1)] {
        let err = store.create("Pay rent", Some(due_at)).unwrap_err();
        assert!(matches!(
            err,
            TaskStoreError::Validation(TaskValidationError::DueDateNotInFuture { .. })
        ));
    }
    assert!(store.is_empty());

    let due_at = start() + Duration::seconds(1);
    store.create("Pay rent", Some(due_at)).unwrap();
    assert_eq!(store.tasks()[0].due_at, Some(due_at));
}

#[test]
fn past_due_dates_are_not_revalidated_as_time_passes() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);
    store
        .create("Submit report", Some(start() + Duration::hours(1)))
        .unwrap();

    clock.advance(Duration::days(2));
    store.toggle_complete(0).unwrap();
    store.create("Another task", None).unwrap();

    assert_eq!(store.tasks()[0].due_at, Some(start() + Duration::hours(1)));
}

#[test]
fn edit_checks_due_date_against_clock_at_call_time() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);
    let due_at = start() + Duration::hours(3);
    store.create("Call plumber", Some(due_at)).unwrap();

    clock.set(due_at);
    let err = store.edit(0, "Call plumber today", Some(due_at)).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(store.tasks()[0].text, "Call plumber");

    clock.set(start());
    store.edit(0, "Call plumber today", Some(due_at)).unwrap();
    assert_eq!(store.tasks()[0].text, "Call plumber today");
}

#[test]
fn edit_replaces_text_and_date_but_keeps_completed() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);
    store.create("Draft letter", Some(start() + Duration::days(1))).unwrap();
    store.toggle_complete(0).unwrap();

    store.edit(0, "  Final letter ", None).unwrap();

    let task = store.task(0).unwrap();
    assert_eq!(task.text, "Final letter");
    assert_eq!(task.due_at, None);
    assert!(task.completed);
    assert_eq!(persisted(&store), store.tasks());
}

#[test]
fn edit_validation_failure_leaves_task_untouched() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);
    let due_at = start() + Duration::hours(3);
    store.create("Call plumber", Some(due_at)).unwrap();

    let short = store.edit(0, "no", None).unwrap_err();
    assert!(short.is_validation());

    let past = store
        .edit(0, "Call the plumber", Some(start() - Duration::minutes(1)))
        .unwrap_err();
    assert!(past.is_validation());

    assert_eq!(store.task(0).unwrap().text, "Call plumber");
    assert_eq!(store.task(0).unwrap().due_at, Some(due_at));
}

#[test]
fn edit_out_of_bounds_is_index_error() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);
    let err = store.edit(0, "Valid text", None).unwrap_err();
    assert!(matches!(err, TaskStoreError::IndexOutOfBounds { index: 0, len: 0 }));
}

#[test]
fn toggle_twice_restores_flag_and_persists_each_time() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);
    store.create("Stretch", None).unwrap();

    assert!(store.toggle_complete(0).unwrap());
    assert!(persisted(&store)[0].completed);

    assert!(!store.toggle_complete(0).unwrap());
    assert!(!persisted(&store)[0].completed);

    assert!(store.toggle_complete(1).unwrap_err().is_index());
}

#[test]
fn delete_removes_only_the_indexed_task() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);
    for text in ["First task", "Second task", "Third task", "Fourth task"] {
        store.create(text, None).unwrap();
    }

    let removed = store.delete(1).unwrap();
    assert_eq!(removed.text, "Second task");
    assert_eq!(texts(&store), ["First task", "Third task", "Fourth task"]);
    assert_eq!(persisted(&store), store.tasks());

    let err = store.delete(3).unwrap_err();
    assert!(matches!(err, TaskStoreError::IndexOutOfBounds { index: 3, len: 3 }));
    assert_eq!(store.len(), 3);
}

#[test]
fn filtered_view_uses_case_insensitive_substring_in_order() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);
    for text in ["Buy milk", "buy Bread", "Clean house"] {
        store.create(text, None).unwrap();
    }

    store.set_search_term("buy");
    let visible = store
        .filtered_view()
        .into_iter()
        .map(|item| (item.index, item.task.text.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(visible, [(0, "Buy milk"), (1, "buy Bread")]);

    store.set_search_term("HOUSE");
    assert_eq!(store.filtered_view()[0].index, 2);
}

#[test]
fn short_search_terms_show_everything() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);
    for text in ["Buy milk", "buy Bread", "Clean house"] {
        store.create(text, None).unwrap();
    }

    for term in ["", "b", "x"] {
        store.set_search_term(term);
        assert_eq!(store.filtered_view().len(), 3);
    }
}

#[test]
fn search_term_is_not_persisted() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);
    store.create("Buy milk", None).unwrap();
    store.set_search_term("zzz");
    assert!(store.filtered_view().is_empty());

    let reopened =
        TaskStore::open_with_clock(TaskPersistence::new(store.persistence().store().clone()), &clock)
            .unwrap();
    assert_eq!(reopened.search_term(), "");
    assert_eq!(reopened.filtered_view().len(), 1);
}

#[test]
fn highlight_follows_current_term() {
    let clock = FixedClock::new(start());
    let mut store = empty_store(&clock);

    store.set_search_term("buy");
    assert_eq!(
        store.highlight("Buy milk"),
        r#"<span class="highlight">Buy</span> milk"#
    );

    store.set_search_term("b");
    assert_eq!(store.highlight("Buy milk"), "Buy milk");
}

#[test]
fn save_failure_keeps_mutation_and_reports_persistence_error() {
    let clock = FixedClock::new(start());
    let mut slots = FlakySlotStore::default();
    slots.inner.write_slot("tasks", "[]").unwrap();
    let mut store = TaskStore::open_with_clock(TaskPersistence::new(slots), &clock).unwrap();

    store.persistence_mut().store_mut().fail_writes = true;
    let err = store.create("Offline task", None).unwrap_err();
    assert!(matches!(
        err,
        TaskStoreError::Persistence(PersistenceError::Storage(StorageError::Unavailable(_)))
    ));
    assert_eq!(store.len(), 1);
    assert!(store.has_unsaved_changes());
    assert!(store.persistence().load().unwrap().is_empty());

    store.persistence_mut().store_mut().fail_writes = false;
    store.flush().unwrap();
    assert!(!store.has_unsaved_changes());
    assert_eq!(store.persistence().load().unwrap(), store.tasks());
}

#[test]
fn validation_errors_do_not_touch_storage() {
    let clock = FixedClock::new(start());
    let mut slots = FlakySlotStore::default();
    slots.inner.write_slot("tasks", "[]").unwrap();
    slots.fail_writes = true;
    let mut store = TaskStore::open_with_clock(TaskPersistence::new(slots), &clock).unwrap();

    let err = store.create("ab", None).unwrap_err();
    assert!(err.is_validation());
    assert!(!store.has_unsaved_changes());
}

#[test]
fn unreadable_storage_fails_to_open() {
    let clock = FixedClock::new(start());
    let result = TaskStore::open_with_clock(TaskPersistence::new(UnreadableSlotStore), &clock);
    assert!(matches!(result, Err(PersistenceError::Storage(_))));
}
