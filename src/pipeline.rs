//! Query execution pipeline.
//!
//! Runs one query through command building, the client process, table
//! parsing and foreign-key analysis. Denylisted statements stop at a
//! `NeedsConfirmation` result until the caller confirms them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::{CommandRunner, DatabaseContext, DriverRegistry};
use crate::error::{GridError, Result};
use crate::fk::{FkAnalysis, ForeignKeyAnalyzer};
use crate::safety::{classify_sql, is_effectively_empty, ClassificationResult};
use crate::table::{AlignedTextParser, ParsedTable, TableParser};
use crate::viewer::DrillDownRequest;

/// Result of submitting a query.
#[derive(Debug)]
pub enum PipelineResult {
    /// Query ran and produced a table.
    Success(QueryOutcome),
    /// Query matched the denylist and needs user confirmation.
    NeedsConfirmation {
        sql: String,
        classification: ClassificationResult,
    },
    /// Query could not be run or produced no table.
    Error(GridError),
}

/// A successfully parsed query result.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub table: ParsedTable,
    pub fk: FkAnalysis,
    /// Where the table came from; `last_query` is the SQL that produced it.
    pub context: DatabaseContext,
    pub execution_time: Duration,
}

/// Shared, cloneable query pipeline.
#[derive(Clone)]
pub struct Pipeline {
    runner: Arc<dyn CommandRunner>,
    registry: Arc<DriverRegistry>,
    parser: Arc<dyn TableParser>,
    analyzer: Arc<ForeignKeyAnalyzer>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("registry", &self.registry)
            .field("analyzer", &self.analyzer)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline with the default registry, the aligned-text
    /// parser and an analyzer that flags nothing.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            registry: Arc::new(DriverRegistry::default()),
            parser: Arc::new(AlignedTextParser::new()),
            analyzer: Arc::new(ForeignKeyAnalyzer::new()),
        }
    }

    /// Creates a pipeline from the loaded configuration.
    pub fn from_config(runner: Arc<dyn CommandRunner>, config: &Config) -> Result<Self> {
        Ok(Self::new(runner)
            .with_registry(DriverRegistry::with_overrides(&config.drivers)?)
            .with_analyzer(ForeignKeyAnalyzer::from_config(&config.foreign_keys)?))
    }

    pub fn with_registry(mut self, registry: DriverRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn TableParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_analyzer(mut self, analyzer: ForeignKeyAnalyzer) -> Self {
        self.analyzer = Arc::new(analyzer);
        self
    }

    /// Checks and runs a query.
    ///
    /// Empty queries fail immediately; denylisted queries return
    /// `NeedsConfirmation` without running anything.
    pub async fn run(&self, context: &DatabaseContext, sql: &str) -> PipelineResult {
        if is_effectively_empty(sql) {
            return PipelineResult::Error(GridError::EmptyQuery);
        }

        let classification = classify_sql(sql);
        if classification.requires_confirmation() {
            warn!(statement = ?classification.matched, "Query needs confirmation");
            return PipelineResult::NeedsConfirmation {
                sql: sql.to_string(),
                classification,
            };
        }

        match self.run_confirmed(context, sql).await {
            Ok(outcome) => PipelineResult::Success(outcome),
            Err(e) => PipelineResult::Error(e),
        }
    }

    /// Runs the lookup query of a drill-down.
    ///
    /// Lookups are plain selects, so a denylist match here means the cell
    /// value smuggled in a statement; it is refused rather than confirmed.
    pub async fn run_drill_down(&self, request: &DrillDownRequest) -> Result<QueryOutcome> {
        debug!(table = %request.table, sql = %request.sql, "Following foreign key");
        match self.run(&request.context, &request.sql).await {
            PipelineResult::Success(outcome) => Ok(outcome),
            PipelineResult::NeedsConfirmation { classification, .. } => {
                Err(GridError::drill_down(format!(
                    "lookup query refused: contains {}",
                    classification.matched.unwrap_or("a denylisted statement")
                )))
            }
            PipelineResult::Error(e) => Err(e),
        }
    }

    /// Runs a query without the denylist check (for confirmed queries).
    pub async fn run_confirmed(&self, context: &DatabaseContext, sql: &str) -> Result<QueryOutcome> {
        if is_effectively_empty(sql) {
            return Err(GridError::EmptyQuery);
        }

        let spec = self.registry.get(context.driver)?;
        if !self.runner.executable_available(&spec.executable) {
            return Err(GridError::ExecutableNotFound(spec.executable.clone()));
        }

        let command = spec.build_command(&context.connection_string, sql)?;
        info!(
            driver = %context.driver,
            connection = %context.display_string(),
            "Running query"
        );
        debug!(sql = %sql, "Query text");

        let start = Instant::now();
        let result = self.runner.run(&command).await?;
        let execution_time = start.elapsed();

        if !result.is_success() {
            warn!(exit_code = result.exit_code, "Client exited with failure");
            return Err(GridError::process(result.exit_code, result.stderr.trim()));
        }

        let table = self.parser.parse(&result.stdout);
        if table.is_empty() {
            debug!(stdout_bytes = result.stdout.len(), "No table in client output");
            return Err(GridError::ParseDegenerate);
        }

        let fk = self.analyzer.analyze(sql, &table.headers);
        info!(
            columns = table.column_count(),
            rows = table.rows.len(),
            fk_columns = fk.columns.len(),
            elapsed_ms = execution_time.as_millis() as u64,
            "Query finished"
        );

        Ok(QueryOutcome {
            table,
            fk,
            context: context.with_query(sql),
            execution_time,
        })
    }
}
