use serde::{Deserialize, Serialize};

pub type TaskId = i64;

/// A single to-do item as it is kept in memory and persisted.
///
/// Field names follow the stored record layout (`dueDate`), and every field
/// except `id` and `text` tolerates being absent so older saved state loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub reminded: bool,
}

impl Task {
    pub fn new(id: TaskId, text: impl Into<String>, due_date: Option<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            due_date,
            reminded: false,
        }
    }
}
