// Task store: in-memory collection synced to a persistence slot

use eyre::{Context, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::filter::Filter;
use crate::models::{Stats, Task, TaskData, now_ms};
use crate::slot::Slot;

/// The task collection and the slot it is persisted to
///
/// A store only exists once its slot has been read, so nothing can be written
/// back before the stored state has been loaded.
pub struct TaskStore<S: Slot> {
    slot: S,
    tasks: Vec<Task>,
    last_id: i64,
}

impl<S: Slot> TaskStore<S> {
    /// Hydrate a store from the given slot
    ///
    /// An empty or malformed blob yields an empty collection; I/O errors from
    /// the slot itself are returned.
    pub fn open(slot: S) -> Result<Self> {
        let blob = slot
            .read()
            .with_context(|| format!("Failed to read slot {}", slot.name()))?;

        let tasks = match blob {
            Some(blob) => decode_tasks(&blob),
            None => Vec::new(),
        };
        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);

        info!(slot = slot.name(), count = tasks.len(), "Loaded tasks");
        Ok(Self { slot, tasks, last_id })
    }

    /// Get the underlying slot
    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Every task, in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new pending task and persist
    pub fn create(&mut self, data: TaskData) -> Result<Task> {
        let id = self.next_id();
        let task = data.into_task(id);
        self.tasks.push(task.clone());
        self.persist()?;

        debug!(id, title = %task.title, "Created task");
        Ok(task)
    }

    /// Replace the editable fields of a task
    ///
    /// Returns false, persisting nothing, if no task has this id.
    pub fn update(&mut self, id: i64, data: TaskData) -> Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "update: no such task");
            return Ok(false);
        };

        task.apply(data);
        self.persist()?;
        Ok(true)
    }

    /// Flip the completion flag of a task
    pub fn toggle_completion(&mut self, id: i64) -> Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "toggle_completion: no such task");
            return Ok(false);
        };

        task.completed = !task.completed;
        debug!(id, completed = task.completed, "Toggled task");
        self.persist()?;
        Ok(true)
    }

    /// Remove a task
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            debug!(id, "delete: no such task");
            return Ok(false);
        }

        debug!(id, "Deleted task");
        self.persist()?;
        Ok(true)
    }

    // ========================================================================
    // Readers
    // ========================================================================

    /// Tasks whose title or description contains `text` (ignoring case) and,
    /// if given, whose completion flag equals `completed`
    pub fn query(&self, text: &str, completed: Option<bool>) -> Query<'_> {
        self.query_with(Filter::new().text(text).completed(completed))
    }

    /// Tasks matching an arbitrary filter, in insertion order
    pub fn query_with(&self, filter: Filter) -> Query<'_> {
        Query {
            tasks: self.tasks.iter(),
            filter,
        }
    }

    pub fn stats(&self) -> Stats {
        Stats::from_tasks(&self.tasks)
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    // Creation timestamp, bumped past the last assigned id when the clock
    // has not moved on. Once ids reach i64::MAX, falls back to the first
    // free id from the clock upward.
    fn next_id(&mut self) -> i64 {
        let id = match self.last_id.checked_add(1) {
            Some(next) => now_ms().max(next),
            None => {
                warn!("Task ids exhausted, reusing free ids");
                self.first_free_id(now_ms())
            }
        };
        self.last_id = self.last_id.max(id);
        id
    }

    fn first_free_id(&self, from: i64) -> i64 {
        let used: HashSet<i64> = self.tasks.iter().map(|t| t.id).collect();
        let mut id = from.max(1);
        while used.contains(&id) {
            id = id.checked_add(1).unwrap_or(1);
        }
        id
    }

    fn persist(&mut self) -> Result<()> {
        let blob = serde_json::to_string(&self.tasks).context("Failed to serialize tasks")?;
        self.slot
            .write(&blob)
            .with_context(|| format!("Failed to write slot {}", self.slot.name()))?;
        Ok(())
    }
}

/// Lazy view over the tasks matching a filter
///
/// Clone it to iterate again from the start.
#[derive(Debug, Clone)]
pub struct Query<'a> {
    tasks: std::slice::Iter<'a, Task>,
    filter: Filter,
}

impl<'a> Iterator for Query<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<&'a Task> {
        let filter = &self.filter;
        self.tasks.by_ref().find(|t| filter.matches(t))
    }
}

/// Decode a slot blob, falling back to an empty collection
///
/// Nothing is surfaced to the caller when the blob is malformed; the stored
/// tasks are dropped the next time the store persists.
pub fn decode_tasks(blob: &str) -> Vec<Task> {
    if blob.trim().is_empty() {
        return Vec::new();
    }

    let tasks: Vec<Task> = match serde_json::from_str(blob) {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!(error = %e, "Failed to parse stored tasks, starting empty");
            return Vec::new();
        }
    };

    let total = tasks.len();
    let tasks: Vec<Task> = tasks.into_iter().filter(|t| !t.title.trim().is_empty()).collect();
    if tasks.len() != total {
        warn!(dropped = total - tasks.len(), "Dropped tasks with blank titles");
    }

    let mut seen = HashSet::new();
    let total = tasks.len();
    let tasks: Vec<Task> = tasks.into_iter().filter(|t| seen.insert(t.id)).collect();
    if tasks.len() != total {
        warn!(dropped = total - tasks.len(), "Dropped tasks with duplicate ids");
    }

    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Priority};
    use crate::slot::{FileSlot, MemorySlot, SqliteSlot};
    use tempfile::TempDir;

    fn data(title: &str, priority: Priority, category: Category) -> TaskData {
        TaskData::new(title, "", priority, category).unwrap()
    }

    fn memory_store() -> TaskStore<MemorySlot> {
        TaskStore::open(MemorySlot::new("tasks")).unwrap()
    }

    #[test]
    fn test_open_empty_slot() {
        let store = memory_store();
        assert!(store.is_empty());
        assert_eq!(store.slot().writes(), 0);
    }

    #[test]
    fn test_create_defaults_and_persists() {
        let mut store = memory_store();
        let before = store.stats();

        let task = store.create(data("Buy milk", Priority::Low, Category::Shopping)).unwrap();
        assert!(!task.completed);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(store.get(task.id), Some(&task));

        let after = store.stats();
        assert_eq!(after.total, before.total + 1);
        assert_eq!(after.completed, before.completed);
        assert_eq!(store.slot().writes(), 1);
        assert!(store.slot().blob().unwrap().contains("\"Buy milk\""));
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut store = memory_store();
        let mut ids = Vec::new();
        for i in 0..50 {
            let task = store.create(data(&format!("Task {}", i), Priority::Low, Category::Work)).unwrap();
            ids.push(task.id);
        }

        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut store = memory_store();
        let first = store.create(data("One", Priority::Low, Category::Work)).unwrap();
        store.delete(first.id).unwrap();
        let second = store.create(data("Two", Priority::Low, Category::Work)).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_ids_continue_past_loaded_ids() {
        let far_future = now_ms() + 1_000_000;
        let blob = format!(
            r#"[{{"id":{},"title":"Later","priority":"Low","category":"Work"}}]"#,
            far_future
        );
        let mut store = TaskStore::open(MemorySlot::with_blob("tasks", &blob)).unwrap();

        let task = store.create(data("Now", Priority::Low, Category::Work)).unwrap();
        assert!(task.id > far_future);
    }

    #[test]
    fn test_create_after_max_id_does_not_overflow() {
        let blob = format!(
            r#"[{{"id":{},"title":"Last","priority":"Low","category":"Work"}}]"#,
            i64::MAX
        );
        let mut store = TaskStore::open(MemorySlot::with_blob("tasks", &blob)).unwrap();

        let a = store.create(data("A", Priority::Low, Category::Work)).unwrap();
        let b = store.create(data("B", Priority::Low, Category::Work)).unwrap();

        assert_ne!(a.id, i64::MAX);
        assert_ne!(b.id, i64::MAX);
        assert_ne!(a.id, b.id);
        assert!(a.id > 0 && b.id > 0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_update_replaces_fields_but_not_completion() {
        let mut store = memory_store();
        let task = store.create(data("Draft", Priority::Low, Category::Work)).unwrap();
        store.toggle_completion(task.id).unwrap();

        let edited = TaskData::new("Final", "notes", Priority::High, Category::Personal).unwrap();
        assert!(store.update(task.id, edited).unwrap());

        let updated = store.get(task.id).unwrap();
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.description, "notes");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.category, Category::Personal);
        assert!(updated.completed);
    }

    #[test]
    fn test_missing_id_is_noop() {
        let mut store = memory_store();
        store.create(data("Only", Priority::Low, Category::Work)).unwrap();
        let snapshot = store.tasks().to_vec();
        let writes = store.slot().writes();

        assert!(!store.update(42, data("Other", Priority::High, Category::Health)).unwrap());
        assert!(!store.toggle_completion(42).unwrap());
        assert!(!store.delete(42).unwrap());

        assert_eq!(store.tasks(), snapshot.as_slice());
        assert_eq!(store.slot().writes(), writes);
    }

    #[test]
    fn test_toggle_is_involution() {
        let mut store = memory_store();
        let task = store.create(data("Walk dog", Priority::Medium, Category::Personal)).unwrap();

        store.toggle_completion(task.id).unwrap();
        assert!(store.get(task.id).unwrap().completed);
        store.toggle_completion(task.id).unwrap();
        assert!(!store.get(task.id).unwrap().completed);
    }

    #[test]
    fn test_delete_then_query() {
        let mut store = memory_store();
        let keep = store.create(data("Keep", Priority::Low, Category::Work)).unwrap();
        let gone = store.create(data("Gone", Priority::Low, Category::Work)).unwrap();

        assert!(store.delete(gone.id).unwrap());

        let ids: Vec<i64> = store.query("", None).map(|t| t.id).collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[test]
    fn test_query_text_scenario() {
        let mut store = memory_store();
        let milk = store.create(data("Buy milk", Priority::Low, Category::Shopping)).unwrap();
        store.create(data("Walk dog", Priority::Low, Category::Personal)).unwrap();

        let hits: Vec<&Task> = store.query("milk", None).collect();
        assert_eq!(hits, vec![&milk]);
    }

    #[test]
    fn test_query_completion_and_order() {
        let mut store = memory_store();
        let a = store.create(data("A task", Priority::Low, Category::Work)).unwrap();
        let b = store.create(data("B task", Priority::Low, Category::Work)).unwrap();
        let c = store.create(data("C task", Priority::Low, Category::Work)).unwrap();
        store.toggle_completion(b.id).unwrap();

        let pending: Vec<i64> = store.query("task", Some(false)).map(|t| t.id).collect();
        assert_eq!(pending, vec![a.id, c.id]);

        let done: Vec<i64> = store.query("TASK", Some(true)).map(|t| t.id).collect();
        assert_eq!(done, vec![b.id]);
    }

    #[test]
    fn test_query_is_restartable() {
        let mut store = memory_store();
        store.create(data("One", Priority::Low, Category::Work)).unwrap();
        store.create(data("Two", Priority::Low, Category::Work)).unwrap();

        let query = store.query("", None);
        assert_eq!(query.clone().count(), 2);
        assert_eq!(query.count(), 2);
    }

    #[test]
    fn test_query_with_category() {
        let mut store = memory_store();
        store.create(data("Report", Priority::Low, Category::Work)).unwrap();
        let gym = store.create(data("Gym", Priority::Low, Category::Health)).unwrap();

        let hits: Vec<i64> = store
            .query_with(Filter::new().category(Category::Health))
            .map(|t| t.id)
            .collect();
        assert_eq!(hits, vec![gym.id]);
    }

    #[test]
    fn test_stats_scenarios() {
        let mut store = memory_store();
        assert_eq!(store.stats().completion_percentage, 0);

        let pending = store.create(data("Pending", Priority::High, Category::Work)).unwrap();
        let done = store.create(data("Done", Priority::High, Category::Work)).unwrap();
        store.create(data("Low", Priority::Low, Category::Work)).unwrap();
        store.toggle_completion(done.id).unwrap();

        let stats = store.stats();
        assert_eq!(stats.high_priority_pending, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completion_percentage, 33);

        store.toggle_completion(pending.id).unwrap();
        assert_eq!(store.stats().completion_percentage, 67);
        assert_eq!(store.stats().high_priority_pending, 0);
    }

    #[test]
    fn test_persist_reload_round_trip_file() {
        let temp = TempDir::new().unwrap();
        let due = chrono::NaiveDate::from_ymd_opt(2026, 11, 1);

        let original = {
            let mut store = TaskStore::open(FileSlot::open(temp.path(), "tasks").unwrap()).unwrap();
            let a = store
                .create(
                    TaskData::new("Dentist", "bring forms", Priority::Medium, Category::Health)
                        .unwrap()
                        .with_due_date(due),
                )
                .unwrap();
            store.create(data("Groceries", Priority::Low, Category::Shopping)).unwrap();
            store.toggle_completion(a.id).unwrap();
            store.tasks().to_vec()
        };

        let reopened = TaskStore::open(FileSlot::open(temp.path(), "tasks").unwrap()).unwrap();
        assert_eq!(reopened.tasks(), original.as_slice());
        assert_eq!(reopened.tasks()[0].due_date, due);
    }

    #[test]
    fn test_persist_reload_round_trip_sqlite() {
        let temp = TempDir::new().unwrap();

        let original = {
            let mut store = TaskStore::open(SqliteSlot::open(temp.path(), "tasks").unwrap()).unwrap();
            store.create(data("Standup", Priority::High, Category::Work)).unwrap();
            store.tasks().to_vec()
        };

        let reopened = TaskStore::open(SqliteSlot::open(temp.path(), "tasks").unwrap()).unwrap();
        assert_eq!(reopened.tasks(), original.as_slice());
    }

    #[test]
    fn test_malformed_blob_falls_back_to_empty() {
        let store = TaskStore::open(MemorySlot::with_blob("tasks", "{not json")).unwrap();
        assert!(store.is_empty());
        // Nothing is written back until the first mutation
        assert_eq!(store.slot().blob(), Some("{not json"));
    }

    #[test]
    fn test_decode_drops_duplicate_ids() {
        let blob = r#"[
            {"id":1,"title":"First","priority":"Low","category":"Work"},
            {"id":1,"title":"Copy","priority":"Low","category":"Work"},
            {"id":2,"title":"Second","priority":"High","category":"Health"}
        ]"#;

        let tasks = decode_tasks(blob);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "First");
        assert_eq!(tasks[1].id, 2);
    }

    #[test]
    fn test_decode_drops_blank_titles() {
        let blob = r#"[
            {"id":1,"title":"","priority":"Low","category":"Work"},
            {"id":2,"title":"   ","priority":"Low","category":"Work"},
            {"id":3,"title":"Kept","priority":"Low","category":"Work"}
        ]"#;

        let tasks = decode_tasks(blob);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 3);
    }

    #[test]
    fn test_open_file_slot_with_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let slot = FileSlot::open(temp.path(), "tasks").unwrap();
        std::fs::write(slot.path(), [0xff, 0xfe, b'[', b']']).unwrap();

        let mut store = TaskStore::open(slot).unwrap();
        assert!(store.is_empty());

        // The store stays usable and overwrites the bad blob
        store.create(data("Fresh start", Priority::Low, Category::Work)).unwrap();
        let reopened = TaskStore::open(FileSlot::open(temp.path(), "tasks").unwrap()).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_decode_blank_blob() {
        assert!(decode_tasks("").is_empty());
        assert!(decode_tasks("[]").is_empty());
    }
}
