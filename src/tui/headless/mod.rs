//! Headless mode for automation and tests.
//!
//! Runs the viewer against a ratatui `TestBackend`, executing scripted key
//! events and capturing the screen and viewer state for verification.
//! Drill-down lookups run inline, so every event sees the settled result.

mod events;
mod output;

pub use events::{parse_script, Assertion, Comparison, StateCheck, StateField, Step};
pub use output::{screen_text, OutputFormat};

use crate::error::{GridError, Result};
use crate::pipeline::Pipeline;
use crate::tui::app::{App, AppAction, Mode};
use crate::tui::{preview, ui};
use crate::viewer::GridViewer;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default headless screen size.
pub const DEFAULT_SIZE: (u16, u16) = (100, 20);

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub width: u16,
    pub height: u16,
    pub output_format: OutputFormat,
    /// Stop at the first failed assertion.
    pub fail_fast: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
            output_format: OutputFormat::Text,
            fail_fast: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssertionCounts {
    pub passed: usize,
    pub failed: usize,
}

/// Result of headless execution; serializes as the JSON report.
#[derive(Debug, Serialize)]
pub struct HeadlessResult {
    /// Final screen content as text.
    pub screen: String,
    pub events_executed: usize,
    #[serde(rename = "duration_ms", serialize_with = "output::as_millis")]
    pub duration: Duration,
    pub assertions: AssertionCounts,
    pub state: HeadlessState,
    /// Screens captured by `snapshot:` events.
    pub snapshots: Vec<Snapshot>,
}

/// A named screen capture.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub name: String,
    pub screen: String,
}

/// Viewer state after the last event.
///
/// Cursor fields are `None` when every viewer has been closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadlessState {
    pub title: Option<String>,
    pub current_row: Option<usize>,
    pub current_col: Option<usize>,
    pub h_offset: Option<usize>,
    pub v_offset: Option<usize>,
    pub match_count: usize,
    pub last_yank: Option<String>,
    /// Number of open viewers.
    pub depth: usize,
    pub mode: String,
    pub running: bool,
    pub notification: Option<String>,
}

impl HeadlessState {
    pub fn from_app(app: &App) -> Self {
        let viewer = app.active();
        let state = viewer.map(|v| v.state());
        Self {
            title: viewer.map(|v| v.title().to_string()),
            current_row: state.map(|s| s.current_row),
            current_col: state.map(|s| s.current_col),
            h_offset: state.map(|s| s.h_offset),
            v_offset: state.map(|s| s.v_offset),
            match_count: state.map_or(0, |s| s.last_search.matches.len()),
            last_yank: app.last_yank.clone(),
            depth: app.depth(),
            mode: match app.mode {
                Mode::Normal => "normal".to_string(),
                Mode::Search(_) => "search".to_string(),
            },
            running: app.running,
            notification: app.notification.as_ref().map(|n| n.message.clone()),
        }
    }
}

/// Runs the viewer without a terminal.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    terminal: Terminal<TestBackend>,
    app: App,
    pipeline: Pipeline,
    steps: Vec<Step>,
    snapshots: Vec<Snapshot>,
    assertions: AssertionCounts,
}

impl HeadlessRunner {
    /// Creates a runner showing `viewer`; drill-downs go through `pipeline`.
    pub fn new(config: HeadlessConfig, viewer: GridViewer, pipeline: Pipeline) -> Result<Self> {
        let backend = TestBackend::new(config.width, config.height);
        let terminal = Terminal::new(backend)
            .map_err(|e| GridError::internal(format!("Failed to create test terminal: {e}")))?;

        let mut app = App::new(viewer);
        app.resize(config.width, config.height);

        Ok(Self {
            config,
            terminal,
            app,
            pipeline,
            steps: Vec::new(),
            snapshots: Vec::new(),
            assertions: AssertionCounts::default(),
        })
    }

    /// Loads a script of comma- or newline-separated steps.
    pub fn load_events(&mut self, input: &str) -> Result<()> {
        self.steps = parse_script(input)?;
        Ok(())
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Executes the loaded events.
    pub async fn run(mut self) -> Result<HeadlessResult> {
        let start_time = Instant::now();
        self.draw()?;

        let steps = std::mem::take(&mut self.steps);
        let mut events_executed = 0;

        for step in steps {
            debug!(step = ?step, "Headless step");
            match step {
                Step::Key(key) => self.press(key).await,
                Step::Type(text) => {
                    for c in text.chars() {
                        self.press(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
                            .await;
                    }
                }
                Step::Resize(width, height) => {
                    self.terminal
                        .resize(Rect::new(0, 0, width, height))
                        .map_err(|e| GridError::internal(format!("Resize failed: {e}")))?;
                    self.app.resize(width, height);
                }
                Step::Snapshot(name) => {
                    self.draw()?;
                    let screen = self.render_screen();
                    self.snapshots.push(Snapshot { name, screen });
                }
                Step::Assert(assertion) => {
                    self.draw()?;
                    let screen = self.render_screen();
                    if assertion.holds(&screen, &HeadlessState::from_app(&self.app)) {
                        self.assertions.passed += 1;
                    } else {
                        debug!(assertion = ?assertion, "Assertion failed");
                        self.assertions.failed += 1;
                        if self.config.fail_fast {
                            events_executed += 1;
                            break;
                        }
                    }
                }
            }

            events_executed += 1;
            self.draw()?;

            if !self.app.running {
                break;
            }
        }

        self.draw()?;
        let screen = self.render_screen();

        Ok(HeadlessResult {
            screen,
            events_executed,
            duration: start_time.elapsed(),
            assertions: self.assertions,
            state: HeadlessState::from_app(&self.app),
            snapshots: self.snapshots,
        })
    }

    /// Handles one key press, running any drill-down to completion.
    async fn press(&mut self, key: KeyEvent) {
        match self.app.handle_key(key) {
            AppAction::None | AppAction::Quit => {}
            AppAction::Yank(text) => {
                // No clipboard without a terminal; the text stays in the state
                self.app.notify(format!("Yanked: {}", preview(&text)));
            }
            AppAction::DrillDown(request) => {
                self.app.start_drill_down(&request);
                let result = self.pipeline.run_drill_down(&request).await;
                self.app.finish_drill_down(&request.table, result);
            }
        }
    }

    fn draw(&mut self) -> Result<()> {
        let app = &self.app;
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| GridError::internal(format!("Failed to render: {e}")))?;
        Ok(())
    }

    fn render_screen(&self) -> String {
        screen_text(self.terminal.backend().buffer())
    }
}

/// Runs headless mode and prints the result. Returns the exit code: 1 when
/// an assertion failed.
pub async fn run_headless(
    config: HeadlessConfig,
    events: &str,
    viewer: GridViewer,
    pipeline: Pipeline,
) -> Result<i32> {
    let mut runner = HeadlessRunner::new(config.clone(), viewer, pipeline)?;
    runner.load_events(events)?;

    let result = runner.run().await?;
    print!("{}", result.report(config.output_format));

    Ok(if result.assertions.failed > 0 { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseContext, MockRunner};
    use crate::config::ForeignKeyConfig;
    use crate::fk::ForeignKeyAnalyzer;
    use crate::pipeline::QueryOutcome;
    use crate::table::{AlignedTextParser, TableParser};
    use std::sync::Arc;

    const POSTS: &str = " id | author_id | title\n----+-----------+-------\n  1 | 7         | hello\n  2 | 8         | world\n(2 rows)\n";
    const AUTHORS: &str = " id | name\n----+------\n  8 | Ada\n(1 row)\n";

    fn analyzer() -> ForeignKeyAnalyzer {
        ForeignKeyAnalyzer::from_config(&ForeignKeyConfig::default()).unwrap()
    }

    fn runner(lookup: &str) -> HeadlessRunner {
        let table = AlignedTextParser::new().parse(POSTS);
        let sql = "SELECT * FROM posts";
        let outcome = QueryOutcome {
            fk: analyzer().analyze(sql, &table.headers),
            table,
            context: DatabaseContext::new("postgresql://x").unwrap().with_query(sql),
            execution_time: Duration::ZERO,
        };
        let pipeline = Pipeline::new(Arc::new(MockRunner::with_stdout(lookup))).with_analyzer(analyzer());
        let viewer = GridViewer::new("Posts", outcome, 12);
        HeadlessRunner::new(HeadlessConfig::default(), viewer, pipeline).unwrap()
    }

    #[tokio::test]
    async fn test_navigation_and_state() {
        let mut runner = runner(AUTHORS);
        runner
            .load_events("key:j,key:l,assert:state:row=2,assert:state:col=2,assert:contains:world")
            .unwrap();
        let result = runner.run().await.unwrap();

        assert_eq!(result.assertions, AssertionCounts { passed: 3, failed: 0 });
        assert_eq!(result.state.current_row, Some(2));
        assert_eq!(result.state.current_col, Some(2));
    }

    #[tokio::test]
    async fn test_drill_down_pushes_viewer() {
        let mut runner = runner(AUTHORS);
        runner.load_events("key:j,key:l,key:f").unwrap();
        let result = runner.run().await.unwrap();

        assert_eq!(result.state.depth, 2);
        assert_eq!(result.state.title.as_deref(), Some("authors"));
        assert!(result.screen.contains("Ada"), "{}", result.screen);
    }

    #[tokio::test]
    async fn test_search_and_yank() {
        let mut runner = runner(AUTHORS);
        runner.load_events("type:/world,key:enter,key:y").unwrap();
        let result = runner.run().await.unwrap();

        assert_eq!(result.state.match_count, 1);
        assert_eq!(result.state.last_yank.as_deref(), Some("title: world"));
        assert_eq!(result.state.notification.as_deref(), Some("Yanked: title: world"));
    }

    #[tokio::test]
    async fn test_failed_assertion_counts() {
        let mut runner = runner(AUTHORS);
        runner.load_events("assert:contains:nowhere,assert:state:depth=1").unwrap();
        let result = runner.run().await.unwrap();

        assert_eq!(result.assertions, AssertionCounts { passed: 1, failed: 1 });
    }

    #[tokio::test]
    async fn test_quit_stops_events() {
        let mut runner = runner(AUTHORS);
        runner.load_events("key:q,key:j").unwrap();
        let result = runner.run().await.unwrap();

        assert_eq!(result.events_executed, 1);
        assert!(!result.state.running);
        assert_eq!(result.state.depth, 0);
        assert_eq!(result.state.current_row, None);
    }

    fn long_runner(config: HeadlessConfig) -> HeadlessRunner {
        let rows: String = (1..=40).map(|i| format!(" {i:>2} | {}\n", i * 3)).collect();
        let raw = format!(" id | total\n----+-------\n{rows}(40 rows)\n");
        let table = AlignedTextParser::new().parse(&raw);
        let outcome = QueryOutcome {
            fk: analyzer().analyze("SELECT * FROM invoices", &table.headers),
            table,
            context: DatabaseContext::new("postgresql://x").unwrap(),
            execution_time: Duration::ZERO,
        };
        let pipeline = Pipeline::new(Arc::new(MockRunner::new()));
        let viewer = GridViewer::new("Invoices", outcome, 10);
        HeadlessRunner::new(config, viewer, pipeline).unwrap()
    }

    #[tokio::test]
    async fn test_paging_and_row_comparisons() {
        // 12 lines of screen: 5 visible rows
        let config = HeadlessConfig {
            height: 12,
            ..HeadlessConfig::default()
        };
        let mut runner = long_runner(config);
        runner
            .load_events(
                "key:ctrl+d,assert:state:row=6,assert:state:v_offset>=1,\
                 key:G,assert:state:row=40,assert:state:v_offset=35,\
                 key:ctrl+u,assert:state:row<40,assert:state:row!=40",
            )
            .unwrap();
        let result = runner.run().await.unwrap();

        assert_eq!(result.assertions, AssertionCounts { passed: 6, failed: 0 });
        // rows 35-39 in view
        assert!(result.screen.contains("105"), "{}", result.screen);
    }

    #[tokio::test]
    async fn test_resize_refills_window() {
        let config = HeadlessConfig {
            height: 12,
            ..HeadlessConfig::default()
        };
        let mut runner = long_runner(config);
        runner
            .load_events("key:G,snapshot:bottom,resize:100x50,assert:state:v_offset=0,assert:state:row=40")
            .unwrap();
        let result = runner.run().await.unwrap();

        assert_eq!(result.assertions.failed, 0, "{:?}", result.state);
        assert_eq!(result.snapshots[0].name, "bottom");
        assert!(result.snapshots[0].screen.contains(" 40 "));
        assert!(result.screen.contains("│ 1 "), "{}", result.screen);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let config = HeadlessConfig {
            fail_fast: true,
            ..HeadlessConfig::default()
        };
        let mut runner = long_runner(config);
        runner
            .load_events("assert:state:depth=3,key:j,assert:absent:invoices")
            .unwrap();
        let result = runner.run().await.unwrap();

        assert_eq!(result.events_executed, 1);
        assert_eq!(result.assertions, AssertionCounts { passed: 0, failed: 1 });
        assert_eq!(result.state.current_row, Some(1));
    }
}
