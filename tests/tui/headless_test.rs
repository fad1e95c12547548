//! Headless runs of the dbgrid binary with canned client output.

use super::common::{run_dbgrid, temp_file, POSTS, QUERIES};

/// Runs `dbgrid --headless` on the `Posts` query with canned output.
fn run_posts(events: &str, extra: &[&str]) -> (i32, String, String) {
    let sql = temp_file(QUERIES);
    let output = temp_file(POSTS);
    let config = temp_file("");
    let mut args = vec![
        sql.path().to_str().unwrap(),
        "--config",
        config.path().to_str().unwrap(),
        "-q",
        "Posts",
        "-u",
        "postgresql://localhost/blog",
        "--headless",
        "--mock-output",
        output.path().to_str().unwrap(),
        "--events",
        events,
    ];
    args.extend_from_slice(extra);
    run_dbgrid(&args)
}

#[test]
fn test_headless_shows_grid() {
    let (code, stdout, _) = run_posts("key:j", &[]);

    assert_eq!(code, 0);
    assert!(stdout.contains("Posts"), "{stdout}");
    assert!(stdout.contains("world"), "{stdout}");
    assert!(stdout.contains("[1 events, "), "{stdout}");
}

#[test]
fn test_headless_json_state() {
    let (code, stdout, _) = run_posts("key:j,key:l", &["--output", "json"]);

    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["state"]["current_row"], 2);
    assert_eq!(parsed["state"]["current_col"], 2);
    assert_eq!(parsed["state"]["depth"], 1);
}

#[test]
fn test_headless_drill_down() {
    let (code, stdout, _) = run_posts(
        "key:l,key:f,assert:state:depth=2,assert:state:title=authors",
        &["--output", "json"],
    );

    assert_eq!(code, 0, "{stdout}");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["assertions"]["passed"], 2);
}

#[test]
fn test_headless_assertion_failure_exit_code() {
    let (code, stdout, _) = run_posts("assert:contains:nonexistent", &[]);

    assert_eq!(code, 1);
    assert!(stdout.contains("1 failed"), "{stdout}");
}

#[test]
fn test_list_queries() {
    let sql = temp_file(QUERIES);
    let (code, stdout, _) = run_dbgrid(&[sql.path().to_str().unwrap(), "--list"]);

    assert_eq!(code, 0);
    assert!(stdout.contains("Posts  every post"), "{stdout}");
    assert!(stdout.contains("Wipe"), "{stdout}");
}

#[test]
fn test_destructive_query_declined_in_headless() {
    let (code, _, stderr) = {
        let sql = temp_file(QUERIES);
        let output = temp_file(POSTS);
        let config = temp_file("");
        run_dbgrid(&[
            sql.path().to_str().unwrap(),
            "--config",
            config.path().to_str().unwrap(),
            "-q",
            "Wipe",
            "-u",
            "postgresql://localhost/blog",
            "--headless",
            "--mock-output",
            output.path().to_str().unwrap(),
        ])
    };

    assert_eq!(code, 0);
    assert!(stderr.contains("Query cancelled"), "{stderr}");
}

#[test]
fn test_unknown_query_fails() {
    let sql = temp_file(QUERIES);
    let config = temp_file("");
    let (code, _, stderr) = run_dbgrid(&[
        sql.path().to_str().unwrap(),
        "--config",
        config.path().to_str().unwrap(),
        "-q",
        "Nope",
        "-u",
        "sqlite://x.db",
    ]);

    assert_eq!(code, 1);
    assert!(stderr.contains("Query not found"), "{stderr}");
}
