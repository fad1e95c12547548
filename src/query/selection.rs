//! Picking the query to run: by name, under the cursor, or from a selection.

use std::collections::BTreeMap;

use super::extractor::{classify_line, LineKind};
use super::NamedQuery;
use crate::error::{GridError, Result};

/// Name given to queries built from an ad-hoc selection.
pub const SELECTION_QUERY_NAME: &str = "selection";

/// Returns the query with the given name. The last one wins on duplicates.
pub fn select_by_name<'a>(queries: &'a [NamedQuery], name: &str) -> Result<&'a NamedQuery> {
    queries
        .iter()
        .rev()
        .find(|q| q.name == name)
        .ok_or_else(|| GridError::QueryNotFound(name.to_string()))
}

/// Returns the query whose `Name:` marker is nearest at or above `line` (1-based).
pub fn query_under_cursor(queries: &[NamedQuery], line: usize) -> Result<&NamedQuery> {
    queries
        .iter()
        .filter(|q| q.source_line <= line)
        .max_by_key(|q| q.source_line)
        .ok_or_else(|| GridError::QueryNotFound(format!("no query block above line {line}")))
}

/// Builds an ad-hoc query from buffer lines `start..=end` (1-based, clamped).
///
/// `-- $n:` lines inside the selection supply parameters; other marker lines
/// are dropped.
pub fn from_selection(text: &str, start: usize, end: usize) -> Result<NamedQuery> {
    let start = start.max(1);
    if end < start {
        return Err(GridError::config(format!("invalid selection {start}:{end}")));
    }

    let mut params = BTreeMap::new();
    let mut body = Vec::new();
    for line in text.lines().skip(start - 1).take(end - start + 1) {
        match classify_line(line) {
            LineKind::Param(index, value) => {
                params.insert(index, value.to_string());
            }
            LineKind::Name(_) | LineKind::Description(_) => {}
            LineKind::Other(sql) => body.push(sql),
        }
    }

    Ok(NamedQuery {
        name: SELECTION_QUERY_NAME.to_string(),
        body: body.join("\n").trim().to_string(),
        description: None,
        params,
        source_line: start,
    })
}
