use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::DesktopNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::DesktopNotifier;

const DISABLE_ENV_VAR: &str = "TODOLIST_DISABLE_NOTIFICATIONS";

pub trait Notifier {
    fn notify(&self, task: &Task) -> Result<(), AppError>;
}

pub fn reminder_message(task: &Task) -> String {
    format!("Reminder: \"{}\" is due soon!", task.text)
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _task: &Task) -> Result<(), AppError> {
        Ok(())
    }
}

/// Writes each reminder to stderr before returning.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, task: &Task) -> Result<(), AppError> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{}", reminder_message(task))?;
        stderr.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Desktop,
    Terminal,
    None,
}

impl FromStr for NotifierKind {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "terminal" | "stderr" => Ok(Self::Terminal),
            "none" | "off" => Ok(Self::None),
            other => Err(AppError::invalid_input(format!(
                "unknown notifier '{other}' (expected desktop, terminal or none)"
            ))),
        }
    }
}

pub fn notifier_for(kind: NotifierKind) -> Box<dyn Notifier> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Box::new(NoopNotifier);
    }

    match kind {
        NotifierKind::Desktop => platform_notifier(),
        NotifierKind::Terminal => Box::new(TerminalNotifier),
        NotifierKind::None => Box::new(NoopNotifier),
    }
}

#[cfg(any(target_os = "linux", windows))]
fn platform_notifier() -> Box<dyn Notifier> {
    Box::new(DesktopNotifier)
}

#[cfg(not(any(target_os = "linux", windows)))]
fn platform_notifier() -> Box<dyn Notifier> {
    tracing::warn!("desktop notifications are not supported on this platform, using terminal");
    Box::new(TerminalNotifier)
}

#[cfg(test)]
mod tests {
    use super::{NoopNotifier, Notifier, NotifierKind, reminder_message};
    use crate::model::Task;

    #[test]
    fn reminder_message_quotes_text() {
        let task = Task::new(1, "Buy milk", None);
        assert_eq!(reminder_message(&task), "Reminder: \"Buy milk\" is due soon!");
    }

    #[test]
    fn notifier_kind_parses_aliases() {
        assert_eq!("Desktop".parse::<NotifierKind>().unwrap(), NotifierKind::Desktop);
        assert_eq!("stderr".parse::<NotifierKind>().unwrap(), NotifierKind::Terminal);
        assert_eq!("off".parse::<NotifierKind>().unwrap(), NotifierKind::None);
        assert_eq!(
            "pager".parse::<NotifierKind>().unwrap_err().code(),
            "invalid_input"
        );
    }

    #[test]
    fn noop_notifier_accepts_everything() {
        assert!(NoopNotifier.notify(&Task::new(1, "x", None)).is_ok());
    }
}
