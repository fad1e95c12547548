//! Configuration management for db-grid.
//!
//! Loads the TOML config file with named connections, client executable
//! overrides, foreign-key heuristics and grid geometry, and resolves which
//! connection string a run should use.

use crate::error::{GridError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no connection is configured.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Connection used when neither `--url` nor `--connection` is given.
    #[serde(default)]
    pub default_connection: Option<String>,

    /// Named connection strings.
    #[serde(default)]
    pub connections: HashMap<String, String>,

    /// Client executable overrides keyed by driver id.
    #[serde(default)]
    pub drivers: HashMap<String, String>,

    #[serde(default)]
    pub foreign_keys: ForeignKeyConfig,

    #[serde(default)]
    pub grid: GridConfig,
}

/// Foreign-key heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyConfig {
    /// Column-name regular expressions that mark a foreign key.
    #[serde(default = "default_fk_patterns")]
    pub patterns: Vec<String>,

    /// Whether to derive a referenced table name for pattern matches.
    #[serde(default = "default_derive_tables")]
    pub derive_tables: bool,

    /// Suffix stripped from the column name when deriving a table name.
    #[serde(default = "default_strip_suffix")]
    pub strip_suffix: String,

    /// Text appended when deriving a table name.
    #[serde(default = "default_table_suffix")]
    pub table_suffix: String,

    /// Explicit column -> table mappings (column names are case-insensitive).
    #[serde(default)]
    pub manual: HashMap<String, String>,
}

fn default_fk_patterns() -> Vec<String> {
    vec!["(?i)_id$".to_string()]
}

fn default_derive_tables() -> bool {
    true
}

fn default_strip_suffix() -> String {
    "_id".to_string()
}

fn default_table_suffix() -> String {
    "s".to_string()
}

impl Default for ForeignKeyConfig {
    fn default() -> Self {
        Self {
            patterns: default_fk_patterns(),
            derive_tables: default_derive_tables(),
            strip_suffix: default_strip_suffix(),
            table_suffix: default_table_suffix(),
            manual: HashMap::new(),
        }
    }
}

/// Grid viewer geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Fixed display width of every column, in characters.
    #[serde(default = "default_column_width")]
    pub column_width: usize,
}

fn default_column_width() -> usize {
    20
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            column_width: default_column_width(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dbgrid")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GridError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            GridError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.grid.column_width < 3 {
            return Err(GridError::config("grid.column_width must be at least 3"));
        }
        if let Some(name) = &self.default_connection {
            if !self.connections.contains_key(name) {
                return Err(GridError::config(format!(
                    "default_connection '{name}' is not defined in [connections]"
                )));
            }
        }
        Ok(())
    }

    /// Resolves the connection string for a run.
    ///
    /// Precedence: explicit URL, named connection, `default_connection`,
    /// then the `DATABASE_URL` environment variable.
    pub fn resolve_connection_string(
        &self,
        url: Option<&str>,
        name: Option<&str>,
    ) -> Result<String> {
        self.resolve_with_env(url, name, std::env::var(DATABASE_URL_ENV).ok())
    }

    fn resolve_with_env(
        &self,
        url: Option<&str>,
        name: Option<&str>,
        env_url: Option<String>,
    ) -> Result<String> {
        if let Some(url) = url {
            return Ok(url.to_string());
        }

        if let Some(name) = name {
            return self
                .connections
                .get(name)
                .cloned()
                .ok_or_else(|| GridError::config(format!("Connection '{name}' not found in config file")));
        }

        if let Some(conn) = self
            .default_connection
            .as_ref()
            .and_then(|name| self.connections.get(name))
        {
            return Ok(conn.clone());
        }

        env_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(GridError::ConfigurationMissing)
    }
}
