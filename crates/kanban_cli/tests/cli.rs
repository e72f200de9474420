//! End-to-end tests for the `kanban` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn kanban(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kanban").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("KANBAN_DB_PATH")
        .env_remove("KANBAN_LOG_DIR")
        .env_remove("KANBAN_LOG_LEVEL")
        .arg("--db")
        .arg(dir.path().join("board.db"));
    cmd
}

fn run_json(dir: &TempDir, args: &[&str]) -> Value {
    let output = kanban(dir).args(args).output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn status_on_fresh_database_reports_empty_columns() {
    let dir = tempfile::tempdir().unwrap();
    kanban(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""success":true"#));

    let status = run_json(&dir, &["status"]);
    assert_eq!(status["status"]["todo"], 0);
    assert_eq!(status["status"]["doing"], 0);
    assert_eq!(status["status"]["done"], 0);
    assert_eq!(status["status"]["total"], 0);
}

#[test]
fn add_list_and_move_round_trip_through_columns() {
    let dir = tempfile::tempdir().unwrap();
    let first = run_json(&dir, &["add", "Write docs", "--due", "2025-03-01"]);
    assert_eq!(first["success"], true);
    assert_eq!(first["column"], "todo");
    assert_eq!(first["position"], 0);
    let second = run_json(&dir, &["add", "Ship", "--column", "Todo"]);
    assert_eq!(second["position"], 1);

    let first_id = first["card_id"].as_i64().unwrap().to_string();
    let moved = run_json(&dir, &["move", &first_id, "done"]);
    assert_eq!(moved["moved_from"], "todo");
    assert_eq!(moved["moved_to"], "done");
    assert_eq!(moved["position"], 0);

    let todo = run_json(&dir, &["list", "todo"]);
    assert_eq!(todo["count"], 1);
    assert_eq!(todo["cards"][0]["title"], "Ship");
    assert_eq!(todo["cards"][0]["position"], 0);

    let done = run_json(&dir, &["list", "done"]);
    assert_eq!(done["cards"][0]["due_at"], "2025-03-01T00:00:00");
}

#[test]
fn checklist_commands_toggle_and_remove_items() {
    let dir = tempfile::tempdir().unwrap();
    let card = run_json(&dir, &["add", "Release"]);
    let card_id = card["card_id"].as_i64().unwrap().to_string();

    let item = run_json(&dir, &["checklist", &card_id, "Tag version"]);
    assert_eq!(item["done"], false);
    let item_id = item["item_id"].as_i64().unwrap().to_string();

    let toggled = run_json(&dir, &["toggle", &item_id]);
    assert_eq!(toggled["done"], true);

    let listed = run_json(&dir, &["list"]);
    assert_eq!(listed["cards"][0]["checklist_count"], 1);
    assert_eq!(listed["cards"][0]["checklist_done"], 1);

    let removed = run_json(&dir, &["checklist-remove", &item_id]);
    assert_eq!(removed["success"], true);
}

#[test]
fn invalid_column_fails_with_envelope_and_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    kanban(&dir)
        .args(["add", "Oops", "--column", "backlog"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""success":false"#))
        .stdout(predicate::str::contains("invalid_input"));
}

#[test]
fn missing_card_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    kanban(&dir)
        .args(["remove", "9999"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("not_found"));
}

#[test]
fn remove_reports_cascaded_rows() {
    let dir = tempfile::tempdir().unwrap();
    let parent = run_json(&dir, &["add", "Epic"]);
    let parent_id = parent["card_id"].as_i64().unwrap().to_string();
    let child = run_json(&dir, &["add", "Story", "--parent", &parent_id]);
    assert_eq!(child["position"], 0);
    run_json(&dir, &["checklist", &parent_id, "Plan"]);

    let removed = run_json(&dir, &["remove", &parent_id]);
    assert_eq!(removed["removed_children"], 1);
    assert_eq!(removed["removed_checklist_items"], 1);

    let status = run_json(&dir, &["status"]);
    assert_eq!(status["status"]["total"], 0);
}

#[test]
fn reset_requires_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    run_json(&dir, &["add", "Temp"]);

    kanban(&dir).arg("reset").assert().failure();
    let reset = run_json(&dir, &["reset", "--yes"]);
    assert_eq!(reset["removed"]["cards"], 1);
    assert_eq!(reset["board"]["name"], "My Board");

    let show = run_json(&dir, &["show"]);
    assert_eq!(show["board"]["columns"].as_array().unwrap().len(), 3);
}
