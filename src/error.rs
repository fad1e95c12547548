//! Error types for db-grid.
//!
//! Every failure of the query pipeline maps onto one variant here and is
//! surfaced to the user as a single notification.

use thiserror::Error;

/// Main error type for db-grid operations.
#[derive(Error, Debug)]
pub enum GridError {
    /// No connection string could be resolved from CLI, config or environment.
    #[error("No database connection configured")]
    ConfigurationMissing,

    /// Connection string scheme not recognized, or no driver registered for it.
    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// The database client binary is not on the search path.
    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),

    /// Nothing left to run after stripping comments and whitespace.
    #[error("Query is empty")]
    EmptyQuery,

    /// The user declined to run a denylisted statement.
    #[error("Query cancelled")]
    UserCancelledDangerousQuery,

    /// Connection string could not be decomposed, or a temp file could not be created.
    #[error("Could not build command: {0}")]
    CommandBuildFailure(String),

    /// The client process exited with a nonzero status.
    #[error("Query failed (exit code {exit_code}): {stderr}")]
    ProcessFailure { exit_code: i32, stderr: String },

    /// No table could be recovered from the client output.
    #[error("No results")]
    ParseDegenerate,

    /// No named query matched the selection.
    #[error("Query not found: {0}")]
    QueryNotFound(String),

    /// Foreign-key drill-down could not be started.
    #[error("Cannot follow foreign key: {0}")]
    DrillDown(String),

    /// Invalid config file, CLI arguments or event scripts.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal failures (terminal I/O, process spawning, ...).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GridError {
    /// Creates an unsupported driver error.
    pub fn unsupported_driver(msg: impl Into<String>) -> Self {
        Self::UnsupportedDriver(msg.into())
    }

    /// Creates a command build error.
    pub fn command_build(msg: impl Into<String>) -> Self {
        Self::CommandBuildFailure(msg.into())
    }

    /// Creates a process failure carrying the captured stderr.
    pub fn process(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ProcessFailure {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Creates a drill-down error.
    pub fn drill_down(msg: impl Into<String>) -> Self {
        Self::DrillDown(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing | Self::Config(_) => "Configuration Error",
            Self::UnsupportedDriver(_) | Self::ExecutableNotFound(_) => "Driver Error",
            Self::EmptyQuery | Self::QueryNotFound(_) => "Query Error",
            Self::UserCancelledDangerousQuery => "Cancelled",
            Self::CommandBuildFailure(_) => "Command Error",
            Self::ProcessFailure { .. } => "Database Error",
            Self::ParseDegenerate => "Results",
            Self::DrillDown(_) => "Foreign Key",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true for outcomes that are not failures: a declined
    /// confirmation or output without a table.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::UserCancelledDangerousQuery | Self::ParseDegenerate)
    }
}

/// Result type alias using GridError.
pub type Result<T> = std::result::Result<T, GridError>;
