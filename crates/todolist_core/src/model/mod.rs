mod due;
mod filter;
mod task;

pub use due::{normalize_due_date, parse_due_date};
pub use filter::FilterMode;
pub use task::{Task, TaskId};
