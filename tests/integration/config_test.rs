//! Config file loading and its effect on the pipeline.

use std::io::Write;
use std::sync::Arc;

use db_grid::config::Config;
use db_grid::db::{DatabaseContext, MockRunner};
use db_grid::error::GridError;
use db_grid::pipeline::{Pipeline, PipelineResult};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_config_file() {
    let file = write_config(
        r#"
default_connection = "app"

[connections]
app = "sqlite:///var/lib/app.db"

[grid]
column_width = 16
"#,
    );

    let config = Config::load_from_file(file.path()).unwrap();
    assert_eq!(config.grid.column_width, 16);
    assert_eq!(
        config.resolve_connection_string(Some("sqlite://other.db"), None).unwrap(),
        "sqlite://other.db"
    );
    assert_eq!(
        config.resolve_connection_string(None, Some("app")).unwrap(),
        "sqlite:///var/lib/app.db"
    );
}

#[test]
fn test_invalid_config_is_a_config_error() {
    let file = write_config("[grid]\ncolumn_width = \"wide\"\n");
    let err = Config::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, GridError::Config(_)), "{err:?}");
}

#[tokio::test]
async fn test_driver_override_and_manual_mapping() {
    let file = write_config(
        r#"
[drivers]
mysql = "/opt/mysql8/bin/mysql"

[foreign_keys]
patterns = []

[foreign_keys.manual]
owner = "accounts"
"#,
    );
    let config = Config::load_from_file(file.path()).unwrap();
    let runner = Arc::new(MockRunner::with_stdout(
        "+----+-------+\n| id | owner |\n+----+-------+\n| 1  | 42    |\n+----+-------+\n",
    ));
    let pipeline = Pipeline::from_config(runner.clone(), &config).unwrap();
    let context = DatabaseContext::new("mysql://localhost/app").unwrap();

    let outcome = match pipeline.run(&context, "SELECT id, owner FROM projects").await {
        PipelineResult::Success(outcome) => outcome,
        other => panic!("Expected Success, got {other:?}"),
    };

    let owner = outcome.fk.columns.get(&2).unwrap();
    assert_eq!(owner.referenced_table.as_deref(), Some("accounts"));
    assert!(outcome.fk.columns.get(&1).is_none());

    let command = &runner.commands()[0].command;
    assert!(command.starts_with("'/opt/mysql8/bin/mysql' --table"), "{command}");
}
