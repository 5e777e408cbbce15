mod timer;

pub use timer::ReminderTimer;

use crate::clock::local_offset;
use crate::error::AppError;
use crate::model::{Task, TaskId, parse_due_date};
use crate::notify::Notifier;
use crate::store::TaskStore;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::{debug, info, warn};

pub const DEFAULT_TICK_SECS: u64 = 30;
pub const DEFAULT_WINDOW_SECS: u64 = 60;
pub const MAX_TICK_SECS: u64 = 86_400;
pub const MAX_WINDOW_SECS: u64 = 7 * 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_tick_secs() -> u64 {
    DEFAULT_TICK_SECS
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            tick_secs: DEFAULT_TICK_SECS,
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }
}

impl ReminderSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.tick_secs == 0 {
            return Err(AppError::invalid_input("reminders.tick_secs must be positive"));
        }
        if self.window_secs == 0 {
            return Err(AppError::invalid_input(
                "reminders.window_secs must be positive",
            ));
        }
        if self.tick_secs > MAX_TICK_SECS {
            return Err(AppError::invalid_input(format!(
                "reminders.tick_secs must be at most {MAX_TICK_SECS}"
            )));
        }
        if self.window_secs > MAX_WINDOW_SECS {
            return Err(AppError::invalid_input(format!(
                "reminders.window_secs must be at most {MAX_WINDOW_SECS}"
            )));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::seconds(i64::try_from(self.window_secs).unwrap_or(i64::MAX))
    }
}

#[derive(Debug)]
pub struct ReminderFailure {
    pub task_id: TaskId,
    pub error: AppError,
}

#[derive(Debug, Default)]
pub struct ReminderOutcome {
    pub reminded: Vec<Task>,
    pub failures: Vec<ReminderFailure>,
}

/// Finds tasks entering their reminder window and notifies each one once.
pub struct ReminderScheduler {
    notifier: Box<dyn Notifier>,
    window: Duration,
    local_offset: UtcOffset,
}

impl ReminderScheduler {
    pub fn new(notifier: Box<dyn Notifier>, settings: &ReminderSettings) -> Self {
        Self {
            notifier,
            window: settings.window(),
            local_offset: local_offset(),
        }
    }

    /// Offset used for stored due dates that carry none.
    pub fn with_local_offset(mut self, offset: UtcOffset) -> Self {
        self.local_offset = offset;
        self
    }

    pub fn is_due_soon(&self, task: &Task, now: OffsetDateTime) -> bool {
        if task.completed || task.reminded {
            return false;
        }

        let Some(raw) = task.due_date.as_deref() else {
            return false;
        };

        match parse_due_date(raw, self.local_offset) {
            Ok(due) => {
                let remaining = due - now;
                remaining > Duration::ZERO && remaining < self.window
            }
            Err(err) => {
                debug!(id = task.id, "ignoring unparseable due date: {err}");
                false
            }
        }
    }

    pub fn due_soon<'a>(&self, tasks: &'a [Task], now: OffsetDateTime) -> Vec<&'a Task> {
        tasks
            .iter()
            .filter(|task| self.is_due_soon(task, now))
            .collect()
    }

    /// Notifies every task due within the window and marks it reminded.
    ///
    /// A task is marked even when its notification fails, so no task is
    /// ever notified twice.
    pub fn tick(&self, store: &mut TaskStore, now: OffsetDateTime) -> ReminderOutcome {
        let due: Vec<Task> = self
            .due_soon(store.tasks(), now)
            .into_iter()
            .cloned()
            .collect();

        let mut outcome = ReminderOutcome::default();
        for task in due {
            match self.notifier.notify(&task) {
                Ok(()) => info!(id = task.id, "reminder fired"),
                Err(err) => {
                    warn!(id = task.id, "reminder notification failed: {err}");
                    outcome.failures.push(ReminderFailure {
                        task_id: task.id,
                        error: err,
                    });
                }
            }

            store.mark_reminded(task.id);
            if let Some(updated) = store.get(task.id) {
                outcome.reminded.push(updated.clone());
            }
        }

        outcome
    }
}
