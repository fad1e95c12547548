//! Pre-execution checks on query text.
//!
//! No SQL is parsed here. A small denylist of destructive statement prefixes
//! triggers a confirmation prompt, and queries that are nothing but comments
//! and whitespace are rejected.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Destructive statements that require confirmation, as
/// (display label, whitespace-tolerant pattern).
const DENYLIST: &[(&str, &str)] = &[
    ("DROP DATABASE", r"(?i)\bDROP\s+DATABASE\b"),
    ("DROP SCHEMA", r"(?i)\bDROP\s+SCHEMA\b"),
    ("TRUNCATE TABLE", r"(?i)\bTRUNCATE\s+TABLE\b"),
];

fn denylist() -> &'static [(&'static str, Regex)] {
    static RES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    RES.get_or_init(|| {
        DENYLIST
            .iter()
            .map(|(label, pattern)| (*label, Regex::new(pattern).expect("valid regex")))
            .collect()
    })
}

/// Safety level of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLevel {
    /// May run without asking.
    Safe,
    /// Matches the denylist; ask before running.
    Destructive,
}

impl SafetyLevel {
    /// Returns true if this safety level requires user confirmation.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Self::Destructive)
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// Result of checking a query against the denylist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub level: SafetyLevel,
    /// Denylisted statement that matched, if any.
    pub matched: Option<&'static str>,
}

impl ClassificationResult {
    /// Returns true if user confirmation is required.
    pub fn requires_confirmation(&self) -> bool {
        self.level.requires_confirmation()
    }

    /// Prompt text shown before running a denylisted query.
    pub fn warning(&self) -> Option<String> {
        self.matched
            .map(|stmt| format!("Query contains {stmt}. This action cannot be undone."))
    }
}

/// Checks a query against the destructive-statement denylist.
pub fn classify_sql(sql: &str) -> ClassificationResult {
    let stripped = strip_comments(sql);
    let matched = denylist()
        .iter()
        .find(|(_, re)| re.is_match(&stripped))
        .map(|(label, _)| *label);

    ClassificationResult {
        level: if matched.is_some() {
            SafetyLevel::Destructive
        } else {
            SafetyLevel::Safe
        },
        matched,
    }
}

/// Removes `--` line comments.
///
/// A `--` inside a single-quoted string or a double-quoted identifier is
/// text, not a comment. Quotes may span lines; a doubled quote inside a
/// string leaves and re-enters it, which keeps the same state.
pub fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                out.push(c);
            }
            continue;
        }
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '-') if chars.peek() == Some(&'-') => {
                in_comment = true;
                continue;
            }
            (None, _) => {}
        }
        out.push(c);
    }
    out
}

/// Returns true when nothing remains after stripping comments and whitespace.
pub fn is_effectively_empty(sql: &str) -> bool {
    strip_comments(sql).trim().is_empty()
}
