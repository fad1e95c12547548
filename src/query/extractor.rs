//! Scans a text buffer for `-- Name:` query blocks.
//!
//! The scan is a two-state machine: either no query is open, or one is
//! being accumulated. A `Name:` marker always closes the open query (keeping
//! it only when its body has content) and opens a new one.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::NamedQuery;

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*--\s*name:\s*(.*)$").expect("valid regex"))
}

fn desc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*--\s*desc(?:ription)?:\s*(.*)$").expect("valid regex")
    })
}

fn param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*--\s*\$([1-9][0-9]*):\s*(.*)$").expect("valid regex"))
}

/// Classification of one buffer line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LineKind<'a> {
    Name(&'a str),
    Description(&'a str),
    Param(u32, &'a str),
    Other(&'a str),
}

pub(crate) fn classify_line(line: &str) -> LineKind<'_> {
    if let Some(caps) = name_re().captures(line) {
        let name = caps.get(1).map_or("", |m| m.as_str());
        return LineKind::Name(name.trim());
    }
    if let Some(caps) = desc_re().captures(line) {
        let desc = caps.get(1).map_or("", |m| m.as_str());
        return LineKind::Description(desc.trim());
    }
    if let Some(caps) = param_re().captures(line) {
        let index = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let value = caps.get(2).map_or("", |m| m.as_str());
        if let Some(index) = index {
            return LineKind::Param(index, value.trim());
        }
    }
    LineKind::Other(line)
}

/// A query whose body is still being collected.
#[derive(Debug)]
struct OpenQuery {
    name: String,
    description: Option<String>,
    params: BTreeMap<u32, String>,
    body: Vec<String>,
    source_line: usize,
}

impl OpenQuery {
    fn new(name: &str, source_line: usize) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            params: BTreeMap::new(),
            body: Vec::new(),
            source_line,
        }
    }

    fn push_body(&mut self, line: &str) {
        if self.body.is_empty() && line.trim().is_empty() {
            return;
        }
        self.body.push(line.to_string());
    }

    /// Closes the query; `None` when no body line has content.
    fn close(self) -> Option<NamedQuery> {
        if self.body.iter().all(|l| l.trim().is_empty()) {
            debug!(name = %self.name, "Dropping query block without a body");
            return None;
        }
        Some(NamedQuery {
            name: self.name,
            body: self.body.join("\n").trim_end().to_string(),
            description: self.description,
            params: self.params,
            source_line: self.source_line,
        })
    }
}

#[derive(Debug, Default)]
enum ScanState {
    #[default]
    NoQueryOpen,
    QueryOpen(OpenQuery),
}

/// Incremental query extractor. Feed lines in order, then call [`finish`].
///
/// [`finish`]: QueryExtractor::finish
#[derive(Debug, Default)]
pub struct QueryExtractor {
    state: ScanState,
    queries: Vec<NamedQuery>,
    line_no: usize,
}

impl QueryExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the next buffer line.
    pub fn feed(&mut self, line: &str) {
        self.line_no += 1;
        let kind = classify_line(line);

        let state = std::mem::take(&mut self.state);
        self.state = match (state, kind) {
            (ScanState::NoQueryOpen, LineKind::Name(name)) => {
                ScanState::QueryOpen(OpenQuery::new(name, self.line_no))
            }
            (ScanState::QueryOpen(open), LineKind::Name(name)) => {
                self.queries.extend(open.close());
                ScanState::QueryOpen(OpenQuery::new(name, self.line_no))
            }
            (ScanState::QueryOpen(mut open), LineKind::Description(desc)) => {
                open.description = Some(desc.to_string());
                ScanState::QueryOpen(open)
            }
            (ScanState::QueryOpen(mut open), LineKind::Param(index, value)) => {
                open.params.insert(index, value.to_string());
                ScanState::QueryOpen(open)
            }
            (ScanState::QueryOpen(mut open), LineKind::Other(text)) => {
                open.push_body(text);
                ScanState::QueryOpen(open)
            }
            (ScanState::NoQueryOpen, _) => ScanState::NoQueryOpen,
        };
    }

    /// Flushes a trailing open query and returns all extracted queries in
    /// buffer order.
    pub fn finish(mut self) -> Vec<NamedQuery> {
        if let ScanState::QueryOpen(open) = std::mem::take(&mut self.state) {
            self.queries.extend(open.close());
        }
        self.queries
    }
}

/// Extracts every named query from a buffer.
pub fn extract_queries(text: &str) -> Vec<NamedQuery> {
    let mut extractor = QueryExtractor::new();
    for line in text.lines() {
        extractor.feed(line);
    }
    let queries = extractor.finish();
    debug!(count = queries.len(), "Extracted named queries");
    queries
}
