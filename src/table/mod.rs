//! Structured tables recovered from database client output.
//!
//! Client output is free-form text, so recovery is heuristic. Parsers sit
//! behind [`TableParser`] so a different output dialect can be swapped in
//! without touching the viewer.

mod aligned;

pub use aligned::AlignedTextParser;

use serde::Serialize;

/// Headers and rows recovered from client output.
///
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Value of the last `Time:` footer line.
    pub timing: Option<String>,
    /// Row count from the last `(n rows)` footer, or the number of parsed rows.
    pub row_count: usize,
}

impl ParsedTable {
    /// Creates a table from headers and rows, dropping rows of the wrong width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows: Vec<Vec<String>> = rows.into_iter().filter(|r| r.len() == width).collect();
        let row_count = rows.len();
        Self {
            headers,
            rows,
            timing: None,
            row_count,
        }
    }

    /// True when there is nothing to display.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Returns the cell at a 1-based position.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row.checked_sub(1)?)?
            .get(col.checked_sub(1)?)
            .map(String::as_str)
    }

    /// Returns the header of a 1-based column.
    pub fn header(&self, col: usize) -> Option<&str> {
        self.headers.get(col.checked_sub(1)?).map(String::as_str)
    }
}

/// Converts raw client stdout into a table. Must be a pure function of its input.
pub trait TableParser: Send + Sync {
    fn parse(&self, raw: &str) -> ParsedTable;
}
