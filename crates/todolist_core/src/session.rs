use crate::model::{FilterMode, Task, TaskId};
use crate::reorder;
use crate::store::TaskStore;
use crate::view;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub id: TaskId,
    pub draft: String,
}

/// Interaction state a front end keeps around the store: the active filter
/// and the task being edited, if any.
pub struct TodoSession {
    store: TaskStore,
    filter: FilterMode,
    editing: Option<EditState>,
}

impl TodoSession {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store,
            filter: FilterMode::All,
            editing: None,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TaskStore {
        &mut self.store
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.filter = mode;
    }

    pub fn visible(&self) -> Vec<&Task> {
        view::project(self.store.tasks(), self.filter)
    }

    pub fn editing(&self) -> Option<&EditState> {
        self.editing.as_ref()
    }

    pub fn add(&mut self, text: &str, due_date: Option<String>) -> Option<TaskId> {
        self.store.add(text, due_date)
    }

    pub fn toggle(&mut self, id: TaskId) -> bool {
        self.store.toggle_completed(id)
    }

    pub fn delete(&mut self, id: TaskId) -> bool {
        let deleted = self.store.delete(id);
        self.drop_stale_edit();
        deleted
    }

    pub fn clear_completed(&mut self) -> usize {
        let removed = self.store.clear_completed();
        self.drop_stale_edit();
        removed
    }

    pub fn mark_all_done(&mut self) -> bool {
        self.store.mark_all_done()
    }

    pub fn start_edit(&mut self, id: TaskId) -> bool {
        let Some(task) = self.store.get(id) else {
            return false;
        };

        self.editing = Some(EditState {
            id,
            draft: task.text.clone(),
        });
        true
    }

    pub fn set_draft(&mut self, text: &str) -> bool {
        match self.editing.as_mut() {
            Some(edit) => {
                edit.draft = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Applies the draft. A blank draft leaves editing open; a task that
    /// vanished meanwhile ends editing without a change.
    pub fn save_edit(&mut self) -> bool {
        let Some(edit) = self.editing.as_ref() else {
            return false;
        };

        if edit.draft.trim().is_empty() {
            return false;
        }

        let id = edit.id;
        let draft = edit.draft.clone();
        self.editing = None;
        self.store.edit_text(id, &draft)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Moves the task at `drag_index` of the current view to `drop_index`.
    pub fn reorder(&mut self, drag_index: usize, drop_index: usize) -> bool {
        match reorder::reorder_ids(self.store.tasks(), self.filter, drag_index, drop_index) {
            Some(order) => self.store.reorder(&order),
            None => false,
        }
    }

    fn drop_stale_edit(&mut self) {
        if let Some(edit) = self.editing.as_ref()
            && !self.store.contains(edit.id)
        {
            self.editing = None;
        }
    }
}
