use clap::{Parser, Subcommand};
use todolist_core::config::ConfigOverrides;
use todolist_core::error::AppError;
use todolist_core::model::{FilterMode, TaskId};
use todolist_core::notify::NotifierKind;

#[derive(Parser, Debug)]
#[command(name = "todolist", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: todolist add "Buy milk" --due 2025-06-01T10:30
    Add {
        text: Option<String>,
        /// Due date, RFC3339 or local YYYY-MM-DDTHH:MM
        #[arg(long, value_name = "DATETIME")]
        due: Option<String>,
    },
    /// Flip a task between open and completed
    ///
    /// Example: todolist toggle 1718000000000
    Toggle { id: TaskId },
    /// Delete a task
    ///
    /// Example: todolist delete 1718000000000
    Delete { id: TaskId },
    /// Replace a task's text
    ///
    /// Example: todolist edit 1718000000000 "Buy oat milk"
    Edit { id: TaskId, text: String },
    /// List tasks
    ///
    /// Example: todolist list --filter active
    List {
        #[arg(long, short, value_parser = parse_filter_mode)]
        filter: Option<FilterMode>,
    },
    /// Remove every completed task
    ClearCompleted,
    /// Mark every task as completed
    MarkAllDone,
    /// Move a task within the listed view (positions from `list`)
    ///
    /// Example: todolist move 3 0 --filter active
    Move {
        from: usize,
        to: usize,
        #[arg(long, short, value_parser = parse_filter_mode)]
        filter: Option<FilterMode>,
    },
    /// Send reminders for tasks due within the reminder window
    Remind,
    /// Set the filter used by `list` and `move` (interactive only)
    Filter {
        #[arg(value_parser = parse_filter_mode)]
        mode: FilterMode,
    },
    /// Begin editing a task (interactive only)
    StartEdit { id: TaskId },
    /// Save the task being edited, optionally with new text (interactive only)
    SaveEdit { text: Option<String> },
    /// Abandon the current edit (interactive only)
    CancelEdit,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Toggle { .. } => "toggle",
            Self::Delete { .. } => "delete",
            Self::Edit { .. } => "edit",
            Self::List { .. } => "list",
            Self::ClearCompleted => "clear-completed",
            Self::MarkAllDone => "mark-all-done",
            Self::Move { .. } => "move",
            Self::Remind => "remind",
            Self::Filter { .. } => "filter",
            Self::StartEdit { .. } => "start-edit",
            Self::SaveEdit { .. } => "save-edit",
            Self::CancelEdit => "cancel-edit",
        }
    }

    pub fn is_interactive_only(&self) -> bool {
        matches!(
            self,
            Self::Filter { .. } | Self::StartEdit { .. } | Self::SaveEdit { .. } | Self::CancelEdit
        )
    }
}

fn parse_filter_mode(raw: &str) -> Result<FilterMode, String> {
    raw.parse::<FilterMode>().map_err(|err| err.message().to_string())
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Notifier,
    TickSecs,
    WindowSecs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (section, field) = key_raw
        .split_once('.')
        .map(|(section, rest)| (Some(section.trim()), rest.trim()))
        .unwrap_or((None, key_raw.trim()));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;
    let canonical_section = match section {
        Some(name) => Some(
            canonicalize_flag_name(name)
                .ok_or_else(|| "override section cannot be empty".to_string())?,
        ),
        None => None,
    };

    let target = match (canonical_section.as_deref(), canonical_field.as_str()) {
        (None, "theme") => ConfigOverrideTarget::Theme,
        (None, "notifier") => ConfigOverrideTarget::Notifier,
        (None | Some("reminders"), "tick_secs") => ConfigOverrideTarget::TickSecs,
        (None | Some("reminders"), "window_secs") => ConfigOverrideTarget::WindowSecs,
        (Some(section), other) => return Err(format!("unknown config field '{section}.{other}'")),
        (None, other) => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `KEY=VALUE` override into typed values.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Notifier => {
                overrides.notifier = Some(parsed.value.parse::<NotifierKind>()?);
            }
            ConfigOverrideTarget::TickSecs => {
                overrides.tick_secs = Some(parse_seconds("reminders.tick_secs", &parsed.value)?);
            }
            ConfigOverrideTarget::WindowSecs => {
                overrides.window_secs =
                    Some(parse_seconds("reminders.window_secs", &parsed.value)?);
            }
        }
    }

    Ok(overrides)
}

fn parse_seconds(key: &str, value: &str) -> Result<u64, AppError> {
    value
        .parse::<u64>()
        .map_err(|_| AppError::invalid_input(format!("{key} must be a whole number of seconds")))
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, collect_config_overrides, parse_config_override,
    };
    use clap::Parser;
    use todolist_core::model::FilterMode;
    use todolist_core::notify::NotifierKind;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" THEME = Midnight ").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::Theme);
        assert_eq!(parsed.value, "Midnight");
    }

    #[test]
    fn parse_config_override_accepts_reminder_section() {
        let parsed = parse_config_override("Reminders.Tick-Secs=5").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::TickSecs);
        assert_eq!(parsed.value, "5");

        let bare = parse_config_override("window_secs = 90").unwrap();
        assert_eq!(bare.target, ConfigOverrideTarget::WindowSecs);
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));

        let err = parse_config_override("reminders.theme=noir").unwrap_err();
        assert!(err.contains("reminders.theme"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("themenoir").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_rejects_empty_section() {
        let err = parse_config_override(".tick_secs=5").unwrap_err();
        assert!(err.contains("section cannot be empty"));
    }

    #[test]
    fn collect_config_overrides_types_values() {
        let raw = vec![
            "notifier=terminal".to_string(),
            "reminders.tick_secs=10".to_string(),
            "theme=noir".to_string(),
        ];

        let overrides = collect_config_overrides(&raw).unwrap();

        assert_eq!(overrides.notifier, Some(NotifierKind::Terminal));
        assert_eq!(overrides.tick_secs, Some(10));
        assert_eq!(overrides.window_secs, None);
        assert_eq!(overrides.theme.as_deref(), Some("noir"));
    }

    #[test]
    fn collect_config_overrides_rejects_bad_numbers() {
        let err = collect_config_overrides(&["window_secs=soon".to_string()]).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn list_filter_parses_mode() {
        let cli = Cli::try_parse_from(["todolist", "list", "--filter", "Completed"]).unwrap();
        match cli.command {
            Command::List { filter } => assert_eq!(filter, Some(FilterMode::Completed)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn list_filter_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["todolist", "list", "--filter", "later"]).is_err());
    }

    #[test]
    fn shell_commands_are_flagged() {
        let cli = Cli::try_parse_from(["todolist", "cancel-edit"]).unwrap();
        assert!(cli.command.is_interactive_only());
        assert_eq!(cli.command.name(), "cancel-edit");

        let cli = Cli::try_parse_from(["todolist", "add", "Buy milk"]).unwrap();
        assert!(!cli.command.is_interactive_only());
    }
}
