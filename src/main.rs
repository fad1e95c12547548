//! dbgrid - run a named SQL query and browse the result in a grid.

use std::io::{self, BufRead, Read, Write};
use std::path::Path;
use std::sync::Arc;

use db_grid::cli::Cli;
use db_grid::config::Config;
use db_grid::db::{CommandRunner, DatabaseContext, MockRunner, ShellRunner};
use db_grid::error::{GridError, Result};
use db_grid::logging;
use db_grid::pipeline::{Pipeline, PipelineResult};
use db_grid::query::{extract_queries, NamedQuery};
use db_grid::safety::ClassificationResult;
use db_grid::tui;
use db_grid::tui::headless::{run_headless, HeadlessConfig};
use db_grid::viewer::GridViewer;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    if cli.headless || cli.list {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) if e.is_benign() => {
            info!("{}", e);
            eprintln!("{e}");
        }
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let text = read_buffer(&cli.file)?;
    let queries = extract_queries(&text);
    info!(count = queries.len(), "Extracted queries");

    if cli.list {
        print_query_list(&queries);
        return Ok(0);
    }

    let query = cli.select_query(&text, &queries)?;
    info!(name = %query.name, line = query.source_line, "Selected query");
    let sql = query.bound_sql();

    let connection =
        config.resolve_connection_string(cli.url.as_deref(), cli.connection.as_deref())?;
    let context = DatabaseContext::new(connection)?;

    let runner: Arc<dyn CommandRunner> = match &cli.mock_output {
        Some(path) => {
            let stdout = std::fs::read_to_string(path).map_err(|e| {
                GridError::config(format!("Failed to read {}: {e}", path.display()))
            })?;
            Arc::new(MockRunner::with_stdout(stdout))
        }
        None => Arc::new(ShellRunner::new()),
    };
    let pipeline = Pipeline::from_config(runner, &config)?;

    let outcome = match pipeline.run(&context, &sql).await {
        PipelineResult::Success(outcome) => outcome,
        PipelineResult::NeedsConfirmation {
            sql,
            classification,
        } => {
            if !confirm(&cli, &classification)? {
                return Err(GridError::UserCancelledDangerousQuery);
            }
            pipeline.run_confirmed(&context, &sql).await?
        }
        PipelineResult::Error(e) => return Err(e),
    };

    let viewer = GridViewer::new(&query.name, outcome, config.grid.column_width);

    if cli.headless {
        let headless = HeadlessConfig {
            width: cli.size.0,
            height: cli.size.1,
            output_format: cli.output,
            fail_fast: cli.fail_fast,
        };
        let events = cli.events.as_deref().unwrap_or_default();
        return run_headless(headless, events, viewer, pipeline).await;
    }

    tui::run(viewer, pipeline).await?;
    Ok(0)
}

/// Reads the SQL buffer from a file, or stdin for `-`.
fn read_buffer(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| GridError::internal(format!("Failed to read stdin: {e}")))?;
        return Ok(buffer);
    }

    std::fs::read_to_string(path)
        .map_err(|e| GridError::config(format!("Failed to read {}: {e}", path.display())))
}

fn print_query_list(queries: &[NamedQuery]) {
    for query in queries {
        match &query.description {
            Some(desc) => println!("{:>5}  {}  {}", query.source_line, query.name, desc),
            None => println!("{:>5}  {}", query.source_line, query.name),
        }
    }
}

/// Asks whether to run a denylisted statement. Headless runs never ask.
fn confirm(cli: &Cli, classification: &ClassificationResult) -> Result<bool> {
    if cli.yes {
        return Ok(true);
    }
    if cli.headless {
        return Ok(false);
    }

    let warning = classification.warning().unwrap_or_default();
    eprint!("{warning}\nRun it anyway? [y/N] ");
    io::stderr()
        .flush()
        .map_err(|e| GridError::internal(format!("Failed to write prompt: {e}")))?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| GridError::internal(format!("Failed to read answer: {e}")))?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
