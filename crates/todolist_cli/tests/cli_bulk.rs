use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("todolist-{nanos}-{name}"))
}

fn write_store(dir: &Path, tasks: serde_json::Value) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("todos.json"), serde_json::to_string(&tasks).unwrap()).unwrap();
}

fn stored(dir: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(dir.join("todos.json")).unwrap()).unwrap()
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_todolist"))
        .args(args)
        .env("TODOLIST_STORE_DIR", dir)
        .env("TODOLIST_CONFIG_PATH", dir.join("config.json"))
        .env("TODOLIST_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run todolist")
}

fn seed(dir: &Path) {
    write_store(
        dir,
        serde_json::json!([
            { "id": 1, "text": "one", "completed": false, "dueDate": null, "reminded": false },
            { "id": 2, "text": "two", "completed": true, "dueDate": null, "reminded": false },
            { "id": 3, "text": "three", "completed": false, "dueDate": null, "reminded": false }
        ]),
    );
}

fn ids(tasks: &serde_json::Value) -> Vec<i64> {
    tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["id"].as_i64().unwrap())
        .collect()
}

#[test]
fn clear_completed_keeps_open_tasks_in_order() {
    let dir = temp_dir("cli-clear");
    seed(&dir);

    let output = run(&dir, &["clear-completed"]);
    let tasks = stored(&dir);
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Cleared 1 completed task(s)"));
    assert_eq!(ids(&tasks), vec![1, 3]);
}

#[test]
fn clear_completed_json_reports_count() {
    let dir = temp_dir("cli-clear-json");
    seed(&dir);

    let first = run(&dir, &["clear-completed", "--json"]);
    let second = run(&dir, &["clear-completed", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    let first: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();
    let second: serde_json::Value = serde_json::from_slice(&second.stdout).unwrap();
    assert_eq!(first["removed"], 1);
    assert_eq!(second["removed"], 0);
}

#[test]
fn mark_all_done_completes_without_reordering() {
    let dir = temp_dir("cli-mark-all");
    seed(&dir);

    let output = run(&dir, &["mark-all-done"]);
    let again = run(&dir, &["mark-all-done"]);
    let tasks = stored(&dir);
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Marked all tasks done"));
    assert!(String::from_utf8_lossy(&again.stdout).contains("All tasks already done"));
    assert_eq!(ids(&tasks), vec![1, 2, 3]);
    assert!(
        tasks
            .as_array()
            .unwrap()
            .iter()
            .all(|task| task["completed"] == true)
    );
}
