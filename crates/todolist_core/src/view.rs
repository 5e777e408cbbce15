use crate::model::{FilterMode, Task};

/// Filtered, canonical-order view over `tasks`.
pub fn project(tasks: &[Task], mode: FilterMode) -> Vec<&Task> {
    tasks.iter().filter(|task| mode.matches(task)).collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ViewCounts {
    pub all: usize,
    pub active: usize,
    pub completed: usize,
}

impl ViewCounts {
    pub fn for_mode(&self, mode: FilterMode) -> usize {
        match mode {
            FilterMode::All => self.all,
            FilterMode::Active => self.active,
            FilterMode::Completed => self.completed,
        }
    }
}

pub fn counts(tasks: &[Task]) -> ViewCounts {
    let completed = tasks.iter().filter(|task| task.completed).count();
    ViewCounts {
        all: tasks.len(),
        active: tasks.len() - completed,
        completed,
    }
}
