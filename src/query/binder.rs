//! Positional parameter substitution.
//!
//! Values are inlined as SQL literals; the client receives a finished query
//! string, never a prepared statement.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid regex")
    })
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Formats a raw parameter value as a SQL literal.
///
/// Quoted values are unwrapped and re-quoted with single quotes, numbers pass
/// through unquoted, and anything else becomes an escaped string literal.
pub fn sql_literal(raw: &str) -> String {
    let value = raw.trim();
    let wrapped = value.len() >= 2
        && ((value.starts_with('\'') && value.ends_with('\''))
            || (value.starts_with('"') && value.ends_with('"')));

    if wrapped {
        quote(&value[1..value.len() - 1])
    } else if numeric_re().is_match(value) {
        value.to_string()
    } else {
        quote(value)
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$(\d+)").expect("valid regex"))
}

/// Replaces every `$n` placeholder that has a value in `params`.
///
/// A single pass over the query: the longest digit run is the index, so `$1`
/// never matches inside `$10`, and substituted values are never rescanned.
pub fn bind_params(query: &str, params: &BTreeMap<u32, String>) -> String {
    placeholder_re()
        .replace_all(query, |caps: &Captures| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(|index| params.get(&index))
                .map(|value| sql_literal(value))
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
