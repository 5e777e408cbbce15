use crate::error::AppError;
use crate::model::{Task, TaskId, parse_due_date};
use crate::storage::KeyValueStore;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use time::UtcOffset;
use tracing::{debug, warn};

pub const TODOS_KEY: &str = "todos";
const STORE_DIR_ENV_VAR: &str = "TODOLIST_STORE_DIR";

/// Resolves the directory holding the task store.
///
/// `TODOLIST_STORE_DIR` wins over `configured`, which wins over the
/// platform config directory.
pub fn store_dir(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(dir) = configured {
        return Ok(dir.to_path_buf());
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("todolist"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("todolist"))
    }
}

/// Serialization boundary between the task collection and a key-value store.
pub struct PersistenceGateway {
    kv: Box<dyn KeyValueStore>,
    key: String,
}

impl PersistenceGateway {
    pub fn new(kv: Box<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, TODOS_KEY)
    }

    pub fn with_key(kv: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// Never fails: absent, unreadable or malformed state yields an empty
    /// collection.
    pub fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(key = %self.key, "discarding stored tasks: {err}");
                Vec::new()
            }
        }
    }

    pub fn try_load(&self) -> Result<Vec<Task>, AppError> {
        let Some(content) = self.kv.get(&self.key)? else {
            debug!(key = %self.key, "no stored tasks");
            return Ok(Vec::new());
        };

        let stored: Vec<Task> =
            serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

        let mut seen = HashSet::with_capacity(stored.len());
        let mut tasks = Vec::with_capacity(stored.len());
        for task in stored {
            if seen.insert(task.id) {
                tasks.push(task);
            } else {
                warn!(id = task.id, "dropping stored task with duplicate id");
            }
        }

        for id in unparseable_due_dates(&tasks) {
            warn!(id, "stored due date cannot be parsed, task will never be reminded");
        }

        Ok(tasks)
    }

    pub fn save(&self, tasks: &[Task]) -> Result<(), AppError> {
        let content =
            serde_json::to_string(tasks).map_err(|err| AppError::invalid_data(err.to_string()))?;
        self.kv.set(&self.key, &content)
    }
}

fn unparseable_due_dates(tasks: &[Task]) -> Vec<TaskId> {
    // The offset only shifts a valid date; it never decides validity.
    tasks
        .iter()
        .filter(|task| {
            task.due_date
                .as_deref()
                .is_some_and(|raw| parse_due_date(raw, UtcOffset::UTC).is_err())
        })
        .map(|task| task.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{PersistenceGateway, TODOS_KEY, unparseable_due_dates};
    use crate::error::AppError;
    use crate::model::Task;
    use crate::storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("todolist-{nanos}-{name}"))
    }

    fn sample_tasks() -> Vec<Task> {
        let mut done = Task::new(2, "Walk dog", Some("2025-06-01T10:30:00Z".into()));
        done.completed = true;
        done.reminded = true;
        vec![Task::new(1, "Buy milk", None), done, Task::new(3, "  spaced  ", None)]
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
            Err(AppError::io("storage unavailable"))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), AppError> {
            Err(AppError::io("storage unavailable"))
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = temp_dir("gateway-round-trip");
        let gateway = PersistenceGateway::new(Box::new(FileKeyValueStore::new(&dir)));
        let tasks = sample_tasks();

        gateway.save(&tasks).unwrap();
        let loaded = gateway.load();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded, tasks);
    }

    #[test]
    fn writes_flat_array_of_records() {
        let kv = Rc::new(MemoryKeyValueStore::new());
        let gateway = PersistenceGateway::new(Box::new(Rc::clone(&kv)));
        gateway.save(&sample_tasks()).unwrap();

        let raw = kv.get(TODOS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        let records = value.as_array().expect("array of tasks");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["id"], 1);
        assert_eq!(records[0]["dueDate"], serde_json::Value::Null);
        assert_eq!(records[1]["dueDate"], "2025-06-01T10:30:00Z");
        assert_eq!(records[1]["reminded"], true);
    }

    #[test]
    fn load_missing_key_is_empty() {
        let gateway = PersistenceGateway::new(Box::new(MemoryKeyValueStore::new()));
        assert!(gateway.load().is_empty());
    }

    #[test]
    fn load_malformed_json_is_empty() {
        let kv = Rc::new(MemoryKeyValueStore::new());
        kv.set(TODOS_KEY, "{ not json").unwrap();
        let gateway = PersistenceGateway::new(Box::new(Rc::clone(&kv)));

        assert!(gateway.load().is_empty());
        assert_eq!(gateway.try_load().unwrap_err().code(), "invalid_data");
    }

    #[test]
    fn load_unreadable_store_is_empty() {
        let gateway = PersistenceGateway::new(Box::new(FailingStore));
        assert!(gateway.load().is_empty());
        assert_eq!(gateway.save(&[]).unwrap_err().code(), "io_error");
    }

    #[test]
    fn load_accepts_records_without_reminded() {
        let kv = Rc::new(MemoryKeyValueStore::new());
        kv.set(
            TODOS_KEY,
            r#"[{"id": 1700000000000, "text": "old", "completed": true, "dueDate": "2025-06-01T10:30"}]"#,
        )
        .unwrap();
        let gateway = PersistenceGateway::new(Box::new(Rc::clone(&kv)));

        let loaded = gateway.load();

        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].completed);
        assert!(!loaded[0].reminded);
        assert_eq!(loaded[0].due_date.as_deref(), Some("2025-06-01T10:30"));
    }

    #[test]
    fn load_keeps_first_of_duplicate_ids() {
        let kv = Rc::new(MemoryKeyValueStore::new());
        kv.set(
            TODOS_KEY,
            r#"[{"id": 1, "text": "first"}, {"id": 1, "text": "second"}, {"id": 2, "text": "other"}]"#,
        )
        .unwrap();
        let gateway = PersistenceGateway::new(Box::new(Rc::clone(&kv)));

        let loaded = gateway.load();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].text, "first");
        assert_eq!(loaded[1].id, 2);
    }

    #[test]
    fn custom_key_is_isolated() {
        let kv = Rc::new(MemoryKeyValueStore::new());
        let primary = PersistenceGateway::new(Box::new(Rc::clone(&kv)));
        let other = PersistenceGateway::with_key(Box::new(Rc::clone(&kv)), "archive");

        primary.save(&sample_tasks()).unwrap();

        assert!(other.load().is_empty());
        assert_eq!(primary.load().len(), 3);
    }

    #[test]
    fn bad_due_dates_are_kept_and_flagged_on_load() {
        let kv = Rc::new(MemoryKeyValueStore::new());
        kv.set(
            TODOS_KEY,
            r#"[{"id":1,"text":"ok","dueDate":"2025-06-01T10:30:00Z"},
                {"id":2,"text":"bad","dueDate":"next tuesday"},
                {"id":3,"text":"none"}]"#,
        )
        .unwrap();
        let gateway = PersistenceGateway::new(Box::new(Rc::clone(&kv)));

        let loaded = gateway.try_load().unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[1].due_date.as_deref(), Some("next tuesday"));
        assert_eq!(unparseable_due_dates(&loaded), vec![2]);
    }
}
