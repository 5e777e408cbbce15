use crate::error::AppError;
use crate::model::Task;
use crate::notify::{Notifier, reminder_message};
use notify_rust::Notification;

pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, task: &Task) -> Result<(), AppError> {
        Notification::new()
            .summary("todolist")
            .body(&reminder_message(task))
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
