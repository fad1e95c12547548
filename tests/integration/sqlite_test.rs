//! Runs against a real `sqlite3` client when one is installed.

use std::sync::Arc;

use db_grid::db::{find_executable, DatabaseContext, ShellRunner};
use db_grid::pipeline::{Pipeline, PipelineResult};
use pretty_assertions::assert_eq;

/// True when `sqlite3` is installed and new enough for `-table` output.
fn sqlite_available() -> bool {
    find_executable("sqlite3").is_some()
        && std::process::Command::new("sqlite3")
            .args(["-table", ":memory:", "SELECT 1"])
            .output()
            .is_ok_and(|out| out.status.success())
}

#[tokio::test]
async fn test_sqlite_round_trip() {
    if !sqlite_available() {
        eprintln!("Skipping test: sqlite3 with -table support not installed");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.db");
    let context = DatabaseContext::new(format!("sqlite://{}", path.display())).unwrap();
    let pipeline = Pipeline::new(Arc::new(ShellRunner::new()));

    // Statements without a result table come back as "no results"
    let setup = pipeline
        .run_confirmed(
            &context,
            "CREATE TABLE users (id INTEGER, name TEXT); INSERT INTO users VALUES (1, 'Ada'), (2, 'Grace');",
        )
        .await;
    assert!(setup.is_err_and(|e| e.is_benign()));

    let outcome = match pipeline.run(&context, "SELECT id, name FROM users ORDER BY id").await {
        PipelineResult::Success(outcome) => outcome,
        other => panic!("Expected Success, got {other:?}"),
    };
    assert_eq!(outcome.table.headers, vec!["id", "name"]);
    assert_eq!(outcome.table.rows, vec![vec!["1", "Ada"], vec!["2", "Grace"]]);
}

#[tokio::test]
async fn test_sqlite_error_is_process_failure() {
    if !sqlite_available() {
        eprintln!("Skipping test: sqlite3 with -table support not installed");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.db");
    let context = DatabaseContext::new(format!("sqlite://{}", path.display())).unwrap();
    let pipeline = Pipeline::new(Arc::new(ShellRunner::new()));

    match pipeline.run(&context, "SELECT * FROM missing").await {
        PipelineResult::Error(e) => assert!(e.to_string().contains("no such table"), "{e}"),
        other => panic!("Expected Error, got {other:?}"),
    }
}
