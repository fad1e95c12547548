//! Database client plumbing for db-grid.
//!
//! Queries run through the database's own command-line client. This module
//! knows which client to use for a connection string, how to build its
//! command line, and how to run it.

mod command;
mod mock;
mod runner;

pub use command::{build_command, shell_quote, ShellCommand};
pub use mock::MockRunner;
pub use runner::{CommandRunner, ExecutionResult, ShellRunner};

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use url::Url;

use crate::error::{GridError, Result};

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverId {
    Postgresql,
    Mysql,
    Sqlite,
}

impl DriverId {
    pub const ALL: [DriverId; 3] = [Self::Postgresql, Self::Mysql, Self::Sqlite];

    /// Returns the driver id as used in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a driver id from a config key.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgresql),
            "mysql" => Some(Self::Mysql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Infers the driver from the connection string's scheme prefix.
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        let (scheme, _) = conn_str.split_once("://").ok_or_else(|| {
            GridError::unsupported_driver(format!(
                "no scheme in connection string '{}'",
                redact_connection_string(conn_str)
            ))
        })?;

        match scheme.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgresql),
            "mysql" => Ok(Self::Mysql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(GridError::unsupported_driver(format!(
                "unrecognized scheme '{other}'"
            ))),
        }
    }

    /// Name of the client binary used when no override is configured.
    pub fn default_executable(&self) -> &'static str {
        match self {
            Self::Postgresql => "psql",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite3",
        }
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered driver: which client binary to run for a driver id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSpec {
    pub id: DriverId,
    pub executable: String,
}

impl DriverSpec {
    /// Creates a spec using the driver's default client binary.
    pub fn new(id: DriverId) -> Self {
        Self {
            id,
            executable: id.default_executable().to_string(),
        }
    }

    /// Creates a spec with a custom client binary.
    pub fn with_executable(id: DriverId, executable: impl Into<String>) -> Self {
        Self {
            id,
            executable: executable.into(),
        }
    }

    /// Builds the shell command that runs `query` against `conn_str`.
    pub fn build_command(&self, conn_str: &str, query: &str) -> Result<ShellCommand> {
        build_command(self, conn_str, query)
    }
}

/// Read-only lookup of driver specs by id.
#[derive(Debug, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<DriverId, DriverSpec>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        let drivers = DriverId::ALL
            .iter()
            .map(|id| (*id, DriverSpec::new(*id)))
            .collect();
        Self { drivers }
    }
}

impl DriverRegistry {
    /// Creates a registry with no drivers.
    pub fn empty() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Creates the default registry with executable overrides applied.
    ///
    /// Keys are driver ids (`postgresql`, `mysql`, `sqlite`).
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Result<Self> {
        let mut registry = Self::default();
        for (key, executable) in overrides {
            let id = DriverId::parse(key)
                .ok_or_else(|| GridError::config(format!("unknown driver '{key}' in [drivers]")))?;
            registry.register(DriverSpec::with_executable(id, executable));
        }
        Ok(registry)
    }

    /// Adds or replaces a driver.
    pub fn register(&mut self, spec: DriverSpec) {
        self.drivers.insert(spec.id, spec);
    }

    /// Returns the spec for a driver id.
    pub fn get(&self, id: DriverId) -> Result<&DriverSpec> {
        self.drivers
            .get(&id)
            .ok_or_else(|| GridError::unsupported_driver(format!("no handler registered for {id}")))
    }

    /// Resolves the driver for a connection string.
    pub fn for_connection_string(&self, conn_str: &str) -> Result<&DriverSpec> {
        self.get(DriverId::from_connection_string(conn_str)?)
    }
}

/// The database that produced a result table.
///
/// Owned by the viewer showing that table so follow-up queries go to the
/// same place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseContext {
    #[serde(skip)]
    pub connection_string: String,
    pub driver: DriverId,
    pub last_query: String,
}

impl DatabaseContext {
    /// Creates a context for a connection string, inferring the driver.
    pub fn new(connection_string: impl Into<String>) -> Result<Self> {
        let connection_string = connection_string.into();
        let driver = DriverId::from_connection_string(&connection_string)?;
        Ok(Self {
            connection_string,
            driver,
            last_query: String::new(),
        })
    }

    /// Returns a copy of this context for a new query.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self {
            last_query: query.into(),
            ..self.clone()
        }
    }

    /// Connection string with any password masked, for logs and titles.
    pub fn display_string(&self) -> String {
        redact_connection_string(&self.connection_string)
    }
}

/// Masks the password component of a URL-style connection string.
pub fn redact_connection_string(conn_str: &str) -> String {
    match Url::parse(conn_str) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_ok() {
                url.to_string()
            } else {
                conn_str.to_string()
            }
        }
        _ => conn_str.to_string(),
    }
}

/// Locates an executable by name on `PATH`, or checks it directly when it
/// contains a path separator.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}
