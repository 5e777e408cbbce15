use tabled::settings::Style;
use tabled::{Table, Tabled};
use todolist_core::config::Palette;
use todolist_core::model::{FilterMode, Task, TaskId};
use todolist_core::session::EditState;
use todolist_core::view::ViewCounts;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "ID")]
    id: TaskId,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Task")]
    text: String,
    #[tabled(rename = "Due")]
    due: String,
}

fn row(position: usize, task: &Task, editing: Option<&EditState>) -> TaskRow {
    let text = match editing {
        Some(edit) if edit.id == task.id => format!("{} (editing: {})", task.text, edit.draft),
        _ => task.text.clone(),
    };
    let due = match (task.due_date.as_deref(), task.reminded) {
        (Some(due), true) => format!("{due} (reminded)"),
        (Some(due), false) => due.to_string(),
        (None, _) => "-".to_string(),
    };

    TaskRow {
        position,
        id: task.id,
        done: if task.completed { "x" } else { "" },
        text,
        due,
    }
}

pub fn render_tasks(tasks: &[&Task], editing: Option<&EditState>) -> String {
    let rows: Vec<TaskRow> = tasks
        .iter()
        .enumerate()
        .map(|(position, task)| row(position, task, editing))
        .collect();
    Table::new(rows).with(Style::psql()).to_string()
}

pub fn render_view(
    tasks: &[&Task],
    mode: FilterMode,
    counts: ViewCounts,
    editing: Option<&EditState>,
    palette: &Palette,
) -> String {
    let mut out = String::new();
    out.push_str(&palette.accentize(&format!("Filter: {mode}")));
    out.push('\n');

    if tasks.is_empty() {
        out.push_str(&palette.mutedize("No tasks"));
    } else {
        out.push_str(&render_tasks(tasks, editing));
    }
    out.push('\n');

    out.push_str(&palette.mutedize(&format!(
        "{} active, {} completed",
        counts.active, counts.completed
    )));
    out
}

pub fn task_label(task: &Task) -> String {
    format!("{} ({})", task.text, task.id)
}
