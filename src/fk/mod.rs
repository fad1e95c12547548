//! Heuristic foreign-key detection for result columns.
//!
//! A column is flagged either by an explicit column-to-table mapping or by
//! matching one of the configured name patterns. Nothing is read from the
//! database catalog, so every flag is a guess with a confidence attached.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::config::ForeignKeyConfig;
use crate::error::{GridError, Result};

/// Column assumed to be the primary key of a referenced table.
pub const DEFAULT_REFERENCED_COLUMN: &str = "id";

fn query_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:FROM|JOIN|UPDATE|INSERT\s+INTO)\s+([A-Za-z_"][\w."]*)"#)
            .expect("valid regex")
    })
}

/// How sure the analyzer is that a column is a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// A column believed to reference another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyInfo {
    /// 1-based column position.
    pub column_index: usize,
    pub column_name: String,
    pub referenced_table: Option<String>,
    pub referenced_column: String,
    pub confidence: Confidence,
}

/// Flagged columns keyed by 1-based column index. Unflagged columns are absent.
pub type ForeignKeyMap = BTreeMap<usize, ForeignKeyInfo>;

/// Derives a table name from a column name, e.g. `user_id` -> `users`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableNameDeriver {
    /// Suffix removed from the column name (case-insensitive).
    pub strip_suffix: Option<String>,
    /// Text appended after stripping.
    pub table_suffix: Option<String>,
}

impl TableNameDeriver {
    pub fn derive(&self, column: &str) -> Option<String> {
        let mut base = column.to_string();
        if let Some(suffix) = self.strip_suffix.as_deref().filter(|s| !s.is_empty()) {
            let cut = column.len().saturating_sub(suffix.len());
            if column.is_char_boundary(cut) && column[cut..].eq_ignore_ascii_case(suffix) {
                base.truncate(cut);
            }
        }
        if base.is_empty() {
            return None;
        }
        if let Some(suffix) = &self.table_suffix {
            base.push_str(suffix);
        }
        Some(base)
    }
}

/// Result of analyzing one query's output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FkAnalysis {
    pub columns: ForeignKeyMap,
    /// Tables named in the query text, in order of first mention.
    pub query_tables: Vec<String>,
}

/// Flags foreign-key columns using manual mappings and name patterns.
#[derive(Debug, Clone, Default)]
pub struct ForeignKeyAnalyzer {
    /// Lowercased column name -> table name.
    manual: HashMap<String, String>,
    patterns: Vec<Regex>,
    deriver: Option<TableNameDeriver>,
}

impl ForeignKeyAnalyzer {
    /// Creates an analyzer that flags nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an analyzer from the `[foreign_keys]` config section.
    pub fn from_config(config: &ForeignKeyConfig) -> Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    GridError::config(format!("invalid foreign key pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let deriver = config.derive_tables.then(|| TableNameDeriver {
            strip_suffix: Some(config.strip_suffix.clone()),
            table_suffix: Some(config.table_suffix.clone()),
        });

        Ok(Self::new()
            .with_manual(&config.manual)
            .with_patterns(patterns)
            .with_deriver(deriver))
    }

    /// Adds column -> table mappings. Column names match case-insensitively.
    pub fn with_manual(mut self, manual: &HashMap<String, String>) -> Self {
        for (column, table) in manual {
            self.manual.insert(column.to_lowercase(), table.clone());
        }
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.patterns.extend(patterns);
        self
    }

    pub fn with_deriver(mut self, deriver: Option<TableNameDeriver>) -> Self {
        self.deriver = deriver;
        self
    }

    /// Flags a single column, manual mapping first.
    pub fn classify(&self, column_index: usize, column_name: &str) -> Option<ForeignKeyInfo> {
        if let Some(table) = self.manual.get(&column_name.to_lowercase()) {
            return Some(ForeignKeyInfo {
                column_index,
                column_name: column_name.to_string(),
                referenced_table: Some(table.clone()),
                referenced_column: DEFAULT_REFERENCED_COLUMN.to_string(),
                confidence: Confidence::High,
            });
        }

        if self.patterns.iter().any(|re| re.is_match(column_name)) {
            let (referenced_table, confidence) = match &self.deriver {
                Some(deriver) => (deriver.derive(column_name), Confidence::Medium),
                None => (None, Confidence::Low),
            };
            return Some(ForeignKeyInfo {
                column_index,
                column_name: column_name.to_string(),
                referenced_table,
                referenced_column: DEFAULT_REFERENCED_COLUMN.to_string(),
                confidence,
            });
        }

        None
    }

    /// Flags the foreign-key columns of a result.
    pub fn analyze(&self, query: &str, headers: &[String]) -> FkAnalysis {
        let columns: ForeignKeyMap = headers
            .iter()
            .enumerate()
            .filter_map(|(i, name)| self.classify(i + 1, name))
            .map(|info| (info.column_index, info))
            .collect();

        let query_tables = referenced_tables(query);
        debug!(
            flagged = columns.len(),
            tables = ?query_tables,
            "Analyzed foreign keys"
        );

        FkAnalysis {
            columns,
            query_tables,
        }
    }
}

/// Collects table names that follow FROM, JOIN, UPDATE or INSERT INTO.
pub fn referenced_tables(query: &str) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for caps in query_table_re().captures_iter(query) {
        let Some(m) = caps.get(1) else { continue };
        let name = m.as_str().replace('"', "");
        if !name.is_empty() && !tables.contains(&name) {
            tables.push(name);
        }
    }
    tables
}
