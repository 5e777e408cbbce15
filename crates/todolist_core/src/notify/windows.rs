use crate::error::AppError;
use crate::model::Task;
use crate::notify::Notifier;
use tauri_winrt_notification::Toast;

pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, task: &Task) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title("todolist")
            .text1(&task.text)
            .text2("is due soon")
            .show()
            .map_err(|err| AppError::io(err.to_string()))
    }
}
