//! Shell command construction for each database client.
//!
//! PostgreSQL queries are written into a self-deleting temporary script so
//! the connection string is expanded by the shell inside the script instead
//! of appearing in the command we hand to the runner.

use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use super::{DriverId, DriverSpec};
use crate::error::{GridError, Result};

/// Heredoc delimiter used in generated psql scripts.
const SQL_HEREDOC_TAG: &str = "DBGRID_SQL_EOF";

/// Client settings sent ahead of every PostgreSQL query.
const PSQL_PREAMBLE: &str = "\\pset format aligned\n\\pset pager off\n\\timing on";

fn mysql_database_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^mysql://[^/]*/([^/?#]+)").expect("valid regex"))
}

fn sqlite_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^sqlite://(.+)$").expect("valid regex"))
}

/// A command line ready to be run by `sh -c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    /// The full command line.
    pub command: String,
    /// The literal query the command was built from.
    pub query: String,
    /// Temporary script that the command deletes after running, if any.
    pub temp_file: Option<PathBuf>,
}

/// Wraps a value in single quotes for POSIX shells.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Wraps a value in double quotes, leaving `$VAR` expansion intact.
fn shell_double_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Builds the command that runs `query` against `conn_str` with the given driver.
pub fn build_command(spec: &DriverSpec, conn_str: &str, query: &str) -> Result<ShellCommand> {
    match spec.id {
        DriverId::Postgresql => build_postgres(&spec.executable, conn_str, query),
        DriverId::Mysql => build_mysql(&spec.executable, conn_str, query),
        DriverId::Sqlite => build_sqlite(&spec.executable, conn_str, query),
    }
}

fn build_postgres(executable: &str, conn_str: &str, query: &str) -> Result<ShellCommand> {
    let script = format!(
        "#!/bin/sh\nexec {exe} {conn} -X -q -v ON_ERROR_STOP=1 -f - <<'{tag}'\n{preamble}\n{query}\n{tag}\n",
        exe = shell_quote(executable),
        conn = shell_double_quote(conn_str),
        tag = SQL_HEREDOC_TAG,
        preamble = PSQL_PREAMBLE,
    );

    let mut file = tempfile::Builder::new()
        .prefix("dbgrid-")
        .suffix(".sh")
        .tempfile()
        .map_err(|e| GridError::command_build(format!("failed to create temp script: {e}")))?;
    file.write_all(script.as_bytes())
        .map_err(|e| GridError::command_build(format!("failed to write temp script: {e}")))?;
    let (_, path) = file
        .keep()
        .map_err(|e| GridError::command_build(format!("failed to keep temp script: {e}")))?;

    let quoted_path = shell_quote(&path.to_string_lossy());
    Ok(ShellCommand {
        command: format!("sh {quoted_path}; status=$?; rm -f {quoted_path}; exit $status"),
        query: query.to_string(),
        temp_file: Some(path),
    })
}

/// Percent-decodes a URL component; credentials and database names may
/// carry encoded `@`, `:` or `/`.
fn decode(component: &str) -> String {
    percent_decode_str(component).decode_utf8_lossy().into_owned()
}

fn build_mysql(executable: &str, conn_str: &str, query: &str) -> Result<ShellCommand> {
    let database = mysql_database_re()
        .captures(conn_str)
        .and_then(|caps| caps.get(1))
        .map(|m| decode(m.as_str()))
        .ok_or_else(|| {
            GridError::command_build("no database name in MySQL connection string")
        })?;

    let mut parts = Vec::new();
    let url = Url::parse(conn_str).ok();
    if let Some(password) = url.as_ref().and_then(|u| u.password()) {
        parts.push(format!("MYSQL_PWD={}", shell_quote(&decode(password))));
    }
    parts.push(shell_quote(executable));
    parts.push("--table".to_string());
    if let Some(url) = &url {
        if let Some(host) = url.host_str().filter(|h| !h.is_empty()) {
            parts.push(format!("-h {}", shell_quote(host)));
        }
        if let Some(port) = url.port() {
            parts.push(format!("-P {port}"));
        }
        if !url.username().is_empty() {
            parts.push(format!("-u {}", shell_quote(&decode(url.username()))));
        }
    }
    parts.push(format!("-e {}", shell_quote(query)));
    parts.push(shell_quote(&database));

    Ok(ShellCommand {
        command: parts.join(" "),
        query: query.to_string(),
        temp_file: None,
    })
}

fn build_sqlite(executable: &str, conn_str: &str, query: &str) -> Result<ShellCommand> {
    let path = sqlite_path_re()
        .captures(conn_str)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| GridError::command_build("no database path in SQLite connection string"))?;

    Ok(ShellCommand {
        command: format!(
            "{} -header -table {} {}",
            shell_quote(executable),
            shell_quote(path),
            shell_quote(query)
        ),
        query: query.to_string(),
        temp_file: None,
    })
}
