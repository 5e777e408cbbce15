use clap::{CommandFactory, Parser};
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, BufReader};
use todolist_cli::cli::{CONFIG_OVERRIDE_FLAG, Cli, Command, collect_config_overrides};
use todolist_cli::render::{render_view, task_label};
use todolist_core::clock::local_offset;
use todolist_core::config::{self, Config, Palette, palette_for_theme};
use todolist_core::error::AppError;
use todolist_core::model::{FilterMode, Task, normalize_due_date};
use todolist_core::notify::notifier_for;
use todolist_core::reminder::{ReminderOutcome, ReminderScheduler, ReminderTimer};
use todolist_core::session::TodoSession;
use todolist_core::storage::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, PersistenceGateway, store_dir,
};
use todolist_core::store::TaskStore;
use todolist_core::view;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    OneShot,
    Shell,
}

enum ShellFlow {
    Continue,
    Exit,
}

struct App {
    session: TodoSession,
    scheduler: ReminderScheduler,
    palette: Palette,
    mode: RunMode,
}

impl App {
    fn new(config: &Config, mode: RunMode) -> Self {
        let kv: Box<dyn KeyValueStore> = match store_dir(config.storage_dir.as_deref()) {
            Ok(dir) => {
                debug!(dir = %dir.display(), "using file store");
                Box::new(FileKeyValueStore::new(dir))
            }
            Err(err) => {
                warn!("no storage directory ({err}), tasks will not be saved");
                Box::new(MemoryKeyValueStore::new())
            }
        };

        let store = TaskStore::open(PersistenceGateway::new(kv));
        let scheduler = ReminderScheduler::new(notifier_for(config.notifier), &config.reminders);

        Self {
            session: TodoSession::new(store),
            scheduler,
            palette: palette_for_theme(config.theme.as_deref()),
            mode,
        }
    }

    fn run_command(&mut self, command: Command, json: bool) -> Result<(), AppError> {
        if self.mode == RunMode::OneShot && command.is_interactive_only() {
            return Err(AppError::invalid_input(format!(
                "`{}` is only available in interactive mode",
                command.name()
            )));
        }

        match command {
            Command::Add { text, due } => {
                let text = text.unwrap_or_default();
                let due = due
                    .as_deref()
                    .map(|raw| normalize_due_date(raw, local_offset()))
                    .transpose()?;

                match self.session.add(&text, due) {
                    Some(id) => self.report_task(id, "Added task", json),
                    None => report_unchanged(json, "Nothing added: text is empty"),
                }
            }
            Command::Toggle { id } => {
                if self.session.toggle(id) {
                    let label = match self.session.store().get(id) {
                        Some(task) if task.completed => "Completed task",
                        _ => "Reopened task",
                    };
                    self.report_task(id, label, json);
                } else {
                    report_unchanged(json, &format!("No task with id {id}"));
                }
            }
            Command::Delete { id } => {
                let existing = self.session.store().get(id).cloned();
                match existing {
                    Some(task) if self.session.delete(id) => print_task(&task, "Deleted task", json),
                    _ => report_unchanged(json, &format!("No task with id {id}")),
                }
            }
            Command::Edit { id, text } => {
                if !self.session.store().contains(id) {
                    report_unchanged(json, &format!("No task with id {id}"));
                } else if self.session.store_mut().edit_text(id, &text) {
                    self.report_task(id, "Updated task", json);
                } else {
                    report_unchanged(json, "Nothing changed: text is empty");
                }
            }
            Command::List { filter } => {
                let mode = filter.unwrap_or(match self.mode {
                    RunMode::Shell => self.session.filter(),
                    RunMode::OneShot => FilterMode::All,
                });
                self.print_view(mode, json)?;
            }
            Command::ClearCompleted => {
                let removed = self.session.clear_completed();
                if json {
                    println!("{}", serde_json::json!({ "removed": removed }));
                } else {
                    println!("Cleared {removed} completed task(s)");
                }
            }
            Command::MarkAllDone => {
                if self.session.mark_all_done() {
                    report_changed(json, "Marked all tasks done");
                } else {
                    report_unchanged(json, "All tasks already done");
                }
            }
            Command::Move { from, to, filter } => {
                let previous = self.session.filter();
                if let Some(mode) = filter {
                    self.session.set_filter(mode);
                }
                let moved = self.session.reorder(from, to);
                let mode = self.session.filter();
                self.session.set_filter(previous);

                if moved {
                    report_changed(json, &format!("Moved task from {from} to {to}"));
                    if !json {
                        self.print_view(mode, false)?;
                    }
                } else {
                    report_unchanged(json, "Nothing moved");
                }
            }
            Command::Remind => {
                let outcome = self
                    .scheduler
                    .tick(self.session.store_mut(), OffsetDateTime::now_utc());
                print_reminders(&outcome, json)?;
            }
            Command::Filter { mode } => {
                self.session.set_filter(mode);
                self.print_view(mode, json)?;
            }
            Command::StartEdit { id } => {
                if self.session.start_edit(id) {
                    let draft = self
                        .session
                        .editing()
                        .map(|edit| edit.draft.clone())
                        .unwrap_or_default();
                    report_changed(json, &format!("Editing task {id}: {draft}"));
                } else {
                    report_unchanged(json, &format!("No task with id {id}"));
                }
            }
            Command::SaveEdit { text } => {
                let Some(id) = self.session.editing().map(|edit| edit.id) else {
                    report_unchanged(json, "Not editing a task");
                    return Ok(());
                };
                if let Some(text) = text {
                    self.session.set_draft(&text);
                }

                if self.session.save_edit() {
                    self.report_task(id, "Updated task", json);
                } else if self.session.editing().is_some() {
                    report_unchanged(json, "Nothing saved: text is empty");
                } else {
                    report_unchanged(json, &format!("No task with id {id}"));
                }
            }
            Command::CancelEdit => {
                self.session.cancel_edit();
                report_changed(json, "Edit cancelled");
            }
        }

        Ok(())
    }

    fn report_task(&self, id: i64, label: &str, json: bool) {
        if let Some(task) = self.session.store().get(id) {
            print_task(task, label, json);
        }
    }

    fn print_view(&self, mode: FilterMode, json: bool) -> Result<(), AppError> {
        let tasks = self.session.store().tasks();
        let visible = view::project(tasks, mode);
        if json {
            let payload = serde_json::to_string(&visible)
                .map_err(|err| AppError::invalid_data(err.to_string()))?;
            println!("{payload}");
        } else {
            println!(
                "{}",
                render_view(
                    &visible,
                    mode,
                    view::counts(tasks),
                    self.session.editing(),
                    &self.palette,
                )
            );
        }
        Ok(())
    }

    fn remind(&mut self) {
        let outcome = self
            .scheduler
            .tick(self.session.store_mut(), OffsetDateTime::now_utc());
        for failure in &outcome.failures {
            eprintln!(
                "ERROR: reminder for task {} failed: {}",
                failure.task_id, failure.error
            );
        }
    }
}

fn print_task(task: &Task, label: &str, json: bool) {
    if json {
        println!("{}", serde_json::json!(task));
    } else {
        println!("{label}: {}", task_label(task));
    }
}

fn report_changed(json: bool, message: &str) {
    if json {
        println!("{}", serde_json::json!({ "changed": true, "message": message }));
    } else {
        println!("{message}");
    }
}

fn report_unchanged(json: bool, message: &str) {
    if json {
        println!("{}", serde_json::json!({ "changed": false, "message": message }));
    } else {
        println!("{message}");
    }
}

fn print_reminders(outcome: &ReminderOutcome, json: bool) -> Result<(), AppError> {
    for failure in &outcome.failures {
        eprintln!(
            "ERROR: reminder for task {} failed: {}",
            failure.task_id, failure.error
        );
    }

    if json {
        let payload = serde_json::to_string(&outcome.reminded)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        println!("{payload}");
    } else if outcome.reminded.is_empty() {
        println!("No reminders due");
    } else {
        for task in &outcome.reminded {
            println!("Reminded: {}", task_label(task));
        }
    }
    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn handle_shell_line(app: &mut App, line: &str) -> ShellFlow {
    let line = line.trim();
    if line.is_empty() {
        return ShellFlow::Continue;
    }

    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ShellFlow::Exit;
    }

    if line == "help" || line == "?" {
        print_help();
        return ShellFlow::Continue;
    }

    let args = match split_command_line(line) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            return ShellFlow::Continue;
        }
    };

    if args.is_empty() {
        return ShellFlow::Continue;
    }

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("todolist".to_string());
    argv.extend(args);

    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            return ShellFlow::Continue;
        }
    };

    if !cli.config_override.is_empty() {
        eprintln!(
            "ERROR: {}",
            AppError::invalid_input(format!(
                "{CONFIG_OVERRIDE_FLAG} is only accepted on the command line"
            ))
        );
        return ShellFlow::Continue;
    }

    if let Err(err) = app.run_command(cli.command, cli.json) {
        eprintln!("ERROR: {}", err);
    }

    ShellFlow::Continue
}

async fn run_shell(app: &mut App, config: &Config) -> Result<(), AppError> {
    let mut timer = ReminderTimer::start(config.reminders.tick_period());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if let ShellFlow::Exit = handle_shell_line(app, &line) {
                    break;
                }
            }
            Some(_) = timer.tick() => app.remind(),
        }
    }

    timer.cancel();
    Ok(())
}

fn run_interactive(config: &Config) -> Result<(), AppError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut app = App::new(config, RunMode::Shell);
    let result = runtime.block_on(run_shell(&mut app, config));
    // a stdin read may still be parked on the blocking pool
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

fn load_config() -> Config {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: ignoring config: {}", err);
    }
    loaded.config
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        let config = load_config();
        if let Err(err) = run_interactive(&config) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let config = match collect_config_overrides(&cli.config_override)
        .and_then(|overrides| config::merge_overrides(&load_config(), &overrides))
    {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    let mut app = App::new(&config, RunMode::OneShot);
    if let Err(err) = app.run_command(cli.command, cli.json) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::split_command_line;

    #[test]
    fn split_command_line_honors_quotes() {
        let args = split_command_line(r#"add "Buy milk" --due 2025-06-01T10:30"#).unwrap();
        assert_eq!(args, vec!["add", "Buy milk", "--due", "2025-06-01T10:30"]);
    }

    #[test]
    fn split_command_line_unescapes_inner_quotes() {
        let args = split_command_line(r#"edit 1 "say \"hi\"""#).unwrap();
        assert_eq!(args, vec!["edit", "1", r#"say "hi""#]);
    }

    #[test]
    fn split_command_line_rejects_unterminated_quote() {
        let err = split_command_line(r#"add "Buy milk"#).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }
}
