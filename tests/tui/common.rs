//! Common test utilities for binary tests.

use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

/// Runs dbgrid with the given arguments.
pub fn run_dbgrid(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_dbgrid"))
        .args(args)
        .env_remove("DATABASE_URL")
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute command");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}

/// Writes `content` to a temp file that lives as long as the handle.
pub fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

pub const QUERIES: &str = "\
-- Name: Posts
-- Desc: every post
SELECT * FROM posts;

-- Name: Wipe
TRUNCATE TABLE posts;
";

pub const POSTS: &str = "\
 id | author_id | title
----+-----------+-------
  1 | 7         | hello
  2 | 8         | world
(2 rows)
";
