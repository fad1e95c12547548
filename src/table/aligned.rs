//! Parser for aligned and pipe-delimited client output.
//!
//! Handles psql's aligned format (`----+----` under the header, `(n rows)`
//! and `Time:` footers) and the bordered `+----+----+` style of
//! `mysql --table` and `sqlite3 -table`. Column boundaries come from the
//! dash runs of the separator line; when there are fewer than two, lines are
//! split on `|` instead.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{ParsedTable, TableParser};

/// Shortest dash run accepted as a single-column separator.
const MIN_SINGLE_SEPARATOR: usize = 3;

fn row_count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((\d+) rows?\)").expect("valid regex"))
}

fn timing_value(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix("Time:").map(str::trim)
}

fn is_footer(line: &str) -> bool {
    row_count_re().is_match(line) || timing_value(line).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    /// Dash runs joined by `+`: one column per run.
    Multi,
    /// A single dash run: one-column output.
    Single,
}

/// Start offsets (in chars) of each run of `-`.
fn dash_runs(line: &str) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, c) in line.chars().enumerate() {
        match (c == '-', start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - s));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, line.chars().count() - s));
    }
    runs
}

fn separator_kind(line: &str) -> Option<Separator> {
    let trimmed = line.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| matches!(c, '-' | '+' | ' ')) {
        return None;
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let flanked_plus = chars.iter().enumerate().any(|(i, c)| {
        *c == '+' && chars[..i].contains(&'-') && chars[i + 1..].contains(&'-')
    });
    let runs = dash_runs(trimmed);

    if flanked_plus && runs.len() >= 2 {
        Some(Separator::Multi)
    } else if runs.len() == 1 && runs[0].1 >= MIN_SINGLE_SEPARATOR {
        Some(Separator::Single)
    } else {
        None
    }
}

/// Walks up from the separator to the header line.
fn find_header(lines: &[&str], separator: usize, kind: Separator) -> Option<usize> {
    (0..separator).rev().find(|&i| {
        let line = lines[i];
        if line.trim().is_empty() || separator_kind(line).is_some() {
            return false;
        }
        match kind {
            Separator::Multi => line.contains('|'),
            Separator::Single => true,
        }
    })
}

/// Slices a line at fixed column offsets. A line that reaches the first
/// column yields one cell per column, empty where it stops short; a line
/// that does not yields nothing.
fn slice_cells(line: &str, bounds: &[usize]) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if bounds.first().map_or(true, |first| *first >= chars.len()) {
        return Vec::new();
    }
    bounds
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let start = start.min(chars.len());
            let end = bounds.get(i + 1).copied().unwrap_or(chars.len()).min(chars.len());
            chars[start..end]
                .iter()
                .filter(|c| **c != '|')
                .collect::<String>()
                .trim()
                .to_string()
        })
        .collect()
}

/// Splits a line on `|`, dropping the empty cells produced by outer pipes.
fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

/// Parser for psql-style aligned tables with a `|` fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlignedTextParser;

impl AlignedTextParser {
    pub fn new() -> Self {
        Self
    }
}

impl TableParser for AlignedTextParser {
    fn parse(&self, raw: &str) -> ParsedTable {
        let lines: Vec<&str> = raw.lines().collect();

        // Footers anywhere in the output; the last occurrence wins
        let mut timing = None;
        let mut footer_count = None;
        for line in &lines {
            if let Some(value) = timing_value(line) {
                timing = Some(value.to_string());
            }
            if let Some(caps) = row_count_re().captures(line) {
                footer_count = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok());
            }
        }

        let empty = || ParsedTable {
            timing: timing.clone(),
            row_count: footer_count.unwrap_or(0),
            ..ParsedTable::default()
        };

        let located = lines.iter().enumerate().find_map(|(i, line)| {
            let kind = separator_kind(line)?;
            find_header(&lines, i, kind).map(|header| (i, header))
        });
        let Some((separator, header)) = located else {
            debug!("No table separator found in client output");
            return empty();
        };

        let bounds: Vec<usize> = dash_runs(lines[separator]).iter().map(|(s, _)| *s).collect();
        let cells_of = |line: &str| {
            if bounds.len() >= 2 {
                slice_cells(line, &bounds)
            } else {
                split_cells(line)
            }
        };

        let headers = cells_of(lines[header]);
        if headers.is_empty() {
            return empty();
        }

        let rows: Vec<Vec<String>> = lines[separator + 1..]
            .iter()
            .take_while(|line| !is_footer(line))
            .filter(|line| !line.trim().is_empty() && separator_kind(line).is_none())
            .map(|line| cells_of(*line))
            .filter(|cells| cells.len() == headers.len())
            .collect();

        debug!(
            columns = headers.len(),
            rows = rows.len(),
            fixed_width = bounds.len() >= 2,
            "Parsed client output"
        );

        let row_count = footer_count.unwrap_or(rows.len());
        ParsedTable {
            headers,
            rows,
            timing,
            row_count,
        }
    }
}
