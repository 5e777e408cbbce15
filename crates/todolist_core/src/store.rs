use crate::clock::{Clock, SystemClock, unix_millis};
use crate::model::{Task, TaskId};
use crate::storage::PersistenceGateway;
use std::collections::HashSet;
use tracing::{debug, error};

type Observer = Box<dyn FnMut(&[Task])>;

/// Owns the canonical, ordered task collection.
///
/// Every mutation builds the next collection and publishes it as a whole:
/// the collection is replaced, written through the gateway, and handed to
/// each observer. Operations that change nothing publish nothing.
pub struct TaskStore {
    tasks: Vec<Task>,
    gateway: PersistenceGateway,
    clock: Box<dyn Clock>,
    observers: Vec<Observer>,
}

impl TaskStore {
    pub fn open(gateway: PersistenceGateway) -> Self {
        Self::open_with_clock(gateway, Box::new(SystemClock))
    }

    pub fn open_with_clock(gateway: PersistenceGateway, clock: Box<dyn Clock>) -> Self {
        let tasks = gateway.load();
        debug!(count = tasks.len(), "loaded tasks");
        Self {
            tasks,
            gateway,
            clock,
            observers: Vec::new(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&[Task]) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn add(&mut self, text: &str, due_date: Option<String>) -> Option<TaskId> {
        if text.trim().is_empty() {
            return None;
        }

        let id = self.next_id();
        let mut next = self.tasks.clone();
        next.push(Task::new(id, text, due_date));
        self.publish(next);
        Some(id)
    }

    pub fn toggle_completed(&mut self, id: TaskId) -> bool {
        self.update(id, |task| {
            task.completed = !task.completed;
            true
        })
    }

    pub fn delete(&mut self, id: TaskId) -> bool {
        if !self.contains(id) {
            return false;
        }

        let next = self
            .tasks
            .iter()
            .filter(|task| task.id != id)
            .cloned()
            .collect();
        self.publish(next);
        true
    }

    pub fn edit_text(&mut self, id: TaskId, new_text: &str) -> bool {
        if new_text.trim().is_empty() {
            return false;
        }

        match self.get(id) {
            None => false,
            Some(task) if task.text == new_text => true,
            Some(_) => self.update(id, |task| {
                task.text = new_text.to_string();
                true
            }),
        }
    }

    /// Returns how many tasks were removed.
    pub fn clear_completed(&mut self) -> usize {
        let next: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| !task.completed)
            .cloned()
            .collect();
        let removed = self.tasks.len() - next.len();
        if removed > 0 {
            self.publish(next);
        }
        removed
    }

    pub fn mark_all_done(&mut self) -> bool {
        if self.tasks.iter().all(|task| task.completed) {
            return false;
        }

        let next = self
            .tasks
            .iter()
            .map(|task| Task {
                completed: true,
                ..task.clone()
            })
            .collect();
        self.publish(next);
        true
    }

    /// Returns false when the task is unknown or was already reminded.
    pub fn mark_reminded(&mut self, id: TaskId) -> bool {
        self.update(id, |task| {
            if task.reminded {
                return false;
            }
            task.reminded = true;
            true
        })
    }

    /// Rebuilds canonical order from `new_order`. Unknown and repeated ids
    /// are skipped, and existing tasks not named in `new_order` are dropped.
    pub fn reorder(&mut self, new_order: &[TaskId]) -> bool {
        let mut seen = HashSet::with_capacity(new_order.len());
        let next: Vec<Task> = new_order
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.get(*id).cloned())
            .collect();

        if next == self.tasks {
            return false;
        }

        self.publish(next);
        true
    }

    fn update<F>(&mut self, id: TaskId, apply: F) -> bool
    where
        F: FnOnce(&mut Task) -> bool,
    {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return false;
        };

        let mut next = self.tasks.clone();
        if !apply(&mut next[index]) {
            return false;
        }

        self.publish(next);
        true
    }

    fn next_id(&self) -> TaskId {
        let candidate = unix_millis(self.clock.now());
        match self.tasks.iter().map(|task| task.id).max() {
            Some(max) if candidate <= max => max + 1,
            _ => candidate,
        }
    }

    fn publish(&mut self, next: Vec<Task>) {
        self.tasks = next;

        if let Err(err) = self.gateway.save(&self.tasks) {
            error!("cannot persist tasks: {err}");
        }
        debug!(count = self.tasks.len(), "published tasks");

        for observer in self.observers.iter_mut() {
            observer(&self.tasks);
        }
    }
}
