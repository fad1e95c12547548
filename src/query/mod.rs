//! Named query blocks: extraction from a text buffer, parameter binding,
//! and the selection commands used to pick a query to run.

mod binder;
mod extractor;
mod selection;

pub use binder::{bind_params, sql_literal};
pub use extractor::{extract_queries, QueryExtractor};
pub use selection::{from_selection, query_under_cursor, select_by_name, SELECTION_QUERY_NAME};

use serde::Serialize;
use std::collections::BTreeMap;

/// A named, optionally described and parameterized query found in a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedQuery {
    /// Name from the `-- Name:` marker.
    pub name: String,
    /// Query text, leading blank lines removed.
    pub body: String,
    /// Text of the `-- Desc:` / `-- Description:` marker, if any.
    pub description: Option<String>,
    /// Literal values for positional placeholders, keyed by index (`$1` -> 1).
    pub params: BTreeMap<u32, String>,
    /// 1-based line of the `-- Name:` marker.
    pub source_line: usize,
}

impl NamedQuery {
    /// Returns the body with all known parameters substituted.
    pub fn bound_sql(&self) -> String {
        bind_params(&self.body, &self.params)
    }

    /// Overrides or adds parameter values.
    pub fn with_params(mut self, overrides: &BTreeMap<u32, String>) -> Self {
        for (index, value) in overrides {
            self.params.insert(*index, value.clone());
        }
        self
    }
}
