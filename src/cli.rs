//! Command-line argument parsing.

use crate::error::{GridError, Result};
use crate::query::{from_selection, query_under_cursor, select_by_name, NamedQuery};
use crate::tui::headless::{OutputFormat, DEFAULT_SIZE};
use clap::{ArgGroup, Parser};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Run named SQL queries from a file and browse the results in a grid.
#[derive(Parser, Debug)]
#[command(name = "dbgrid")]
#[command(version, about, long_about = None)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["query", "line", "selection", "list"])
))]
pub struct Cli {
    /// SQL file containing `-- Name:` blocks ("-" reads stdin)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Run the query with this name
    #[arg(short = 'q', long, value_name = "NAME")]
    pub query: Option<String>,

    /// Run the query whose block contains this line
    #[arg(short = 'l', long, value_name = "N")]
    pub line: Option<usize>,

    /// Run lines START through END as one query
    #[arg(short = 's', long, value_name = "START:END", value_parser = parse_selection)]
    pub selection: Option<(usize, usize)>,

    /// List the named queries in FILE and exit
    #[arg(long)]
    pub list: bool,

    /// Connection string (postgresql://, mysql://, sqlite://)
    #[arg(short = 'u', long, value_name = "CONN")]
    pub url: Option<String>,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a positional parameter, e.g. `-p 1=42` (repeatable)
    #[arg(short = 'p', long = "param", value_name = "N=VALUE", value_parser = parse_param)]
    pub params: Vec<(u32, String)>,

    /// Run destructive statements without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    // === Headless mode options ===
    /// Run the viewer without a terminal (for testing/automation)
    #[arg(long)]
    pub headless: bool,

    /// Comma-separated events to execute in headless mode (e.g., "key:j,key:f")
    #[arg(long, value_name = "EVENTS", requires = "headless")]
    pub events: Option<String>,

    /// Screen size for headless mode (WIDTHxHEIGHT)
    #[arg(long, value_name = "SIZE", value_parser = parse_screen_size, default_value = "100x20")]
    pub size: (u16, u16),

    /// Output format for headless mode (text or json)
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Stop on first assertion failure
    #[arg(long, requires = "headless")]
    pub fail_fast: bool,

    /// Use this file as the client's output instead of running a process
    #[arg(long, value_name = "PATH", requires = "headless")]
    pub mock_output: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Parameter overrides from `--param`, last occurrence wins.
    pub fn param_overrides(&self) -> BTreeMap<u32, String> {
        self.params.iter().cloned().collect()
    }

    /// Picks the query to run from `text` according to `--query`, `--line`
    /// or `--selection`, with `--param` overrides applied.
    pub fn select_query(&self, text: &str, queries: &[NamedQuery]) -> Result<NamedQuery> {
        let query = if let Some(name) = &self.query {
            select_by_name(queries, name)?.clone()
        } else if let Some(line) = self.line {
            query_under_cursor(queries, line)?.clone()
        } else if let Some((start, end)) = self.selection {
            from_selection(text, start, end)?
        } else {
            // --list is handled before a query is needed
            return Err(GridError::config(
                "one of --query, --line or --selection is required",
            ));
        };
        Ok(query.with_params(&self.param_overrides()))
    }
}

/// Parses `N=VALUE` where N is a positive placeholder index.
pub fn parse_param(s: &str) -> std::result::Result<(u32, String), String> {
    let (index, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid parameter: '{s}'. Expected N=VALUE (e.g., 1=42)"))?;
    let index = index
        .trim()
        .trim_start_matches('$')
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("Invalid parameter index: '{index}'"))?;
    Ok((index, value.to_string()))
}

/// Parses `START:END` line numbers.
pub fn parse_selection(s: &str) -> std::result::Result<(usize, usize), String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("Invalid selection: '{s}'. Expected START:END (e.g., 3:7)"))?;
    let start = start
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid start line: '{start}'"))?;
    let end = end
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid end line: '{end}'"))?;
    Ok((start, end))
}

/// Parses a screen size like `100x20`.
pub fn parse_screen_size(s: &str) -> std::result::Result<(u16, u16), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid size format: '{}'. Expected WIDTHxHEIGHT (e.g., {}x{})",
            s, DEFAULT_SIZE.0, DEFAULT_SIZE.1
        ));
    }
    let width = parts[0]
        .parse::<u16>()
        .map_err(|_| format!("Invalid width: '{}'", parts[0]))?;
    let height = parts[1]
        .parse::<u16>()
        .map_err(|_| format!("Invalid height: '{}'", parts[1]))?;
    Ok((width, height))
}
