use crate::model::{FilterMode, Task, TaskId};
use crate::view;

/// Translates a drag within the filtered view into a full canonical order.
///
/// `from` and `to` are positions in the view for `mode`. The dragged task is
/// removed at `from` and reinserted at `to` on the shortened list (clamped
/// to its end). Tasks hidden by `mode` keep their canonical slots; only the
/// slots held by visible tasks are refilled in the new visible order.
///
/// Returns `None` when `from` is outside the view.
pub fn reorder_ids(tasks: &[Task], mode: FilterMode, from: usize, to: usize) -> Option<Vec<TaskId>> {
    let visible: Vec<TaskId> = view::project(tasks, mode)
        .into_iter()
        .map(|task| task.id)
        .collect();
    let reordered = splice(&visible, from, to)?;
    Some(merge_into_canonical(tasks, mode, &reordered))
}

pub fn splice(ids: &[TaskId], from: usize, to: usize) -> Option<Vec<TaskId>> {
    if from >= ids.len() {
        return None;
    }

    let mut items = ids.to_vec();
    let dragged = items.remove(from);
    let target = to.min(items.len());
    items.insert(target, dragged);
    Some(items)
}

fn merge_into_canonical(tasks: &[Task], mode: FilterMode, reordered: &[TaskId]) -> Vec<TaskId> {
    let mut visible = reordered.iter();
    tasks
        .iter()
        .map(|task| {
            if mode.matches(task) {
                visible.next().copied().unwrap_or(task.id)
            } else {
                task.id
            }
        })
        .collect()
}
