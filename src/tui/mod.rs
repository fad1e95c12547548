//! Terminal user interface for the grid viewer.
//!
//! Provides the main TUI loop using ratatui and crossterm.

pub mod app;
mod clipboard;
mod events;
pub mod headless;
pub mod ui;
pub mod widgets;

pub use app::{App, AppAction};
pub use events::{Event, EventHandler};

use crate::error::{GridError, Result};
use crate::pipeline::{Pipeline, QueryOutcome};
use crate::viewer::{DrillDownRequest, GridViewer};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A finished drill-down: the new viewer's title and the lookup result.
type DrillDownResult = (String, Result<QueryOutcome>);

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        let event_handler = EventHandler::new();

        // Clipboard problems only matter once something is yanked
        if let Err(e) = clipboard::init() {
            warn!("Failed to initialize clipboard: {}", e);
        }

        Ok(Self {
            terminal,
            event_handler,
        })
    }

    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| GridError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| GridError::internal(format!("Failed to enter alternate screen: {e}")))?;

        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend)
            .map_err(|e| GridError::internal(format!("Failed to create terminal: {e}")))
    }

    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| GridError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| GridError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| GridError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the viewer until the last grid is closed.
    pub async fn run(&mut self, mut app: App, pipeline: Pipeline) -> Result<()> {
        // Restore the terminal before the panic message is printed
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let size = self
            .terminal
            .size()
            .map_err(|e| GridError::internal(format!("Failed to read terminal size: {e}")))?;
        app.resize(size.width, size.height);

        let (tx, mut rx) = mpsc::channel::<DrillDownResult>(4);
        let result = self.run_event_loop(&mut app, &pipeline, &tx, &mut rx).await;

        let _ = panic::take_hook();
        result
    }

    async fn run_event_loop(
        &mut self,
        app: &mut App,
        pipeline: &Pipeline,
        tx: &mpsc::Sender<DrillDownResult>,
        rx: &mut mpsc::Receiver<DrillDownResult>,
    ) -> Result<()> {
        while app.running {
            self.terminal
                .draw(|frame| ui::render(frame, app))
                .map_err(|e| GridError::internal(format!("Failed to draw: {e}")))?;

            tokio::select! {
                event = self.event_handler.next() => match event? {
                    Event::Key(key) => {
                        let action = app.handle_key(key);
                        perform(action, app, pipeline, tx);
                    }
                    Event::Resize(width, height) => app.resize(width, height),
                    Event::Tick => {}
                },
                Some((title, result)) = rx.recv() => {
                    app.finish_drill_down(&title, result);
                }
            }
        }

        info!("Viewer closed");
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(e) = self.restore_terminal() {
            eprintln!("Failed to restore terminal: {e}");
        }
    }
}

/// Carries out the side effect of a key press.
fn perform(
    action: AppAction,
    app: &mut App,
    pipeline: &Pipeline,
    tx: &mpsc::Sender<DrillDownResult>,
) {
    match action {
        AppAction::None | AppAction::Quit => {}
        AppAction::Yank(text) => yank(app, &text),
        AppAction::DrillDown(request) => {
            app.start_drill_down(&request);
            spawn_drill_down(request, pipeline.clone(), tx.clone());
        }
    }
}

fn spawn_drill_down(request: DrillDownRequest, pipeline: Pipeline, tx: mpsc::Sender<DrillDownResult>) {
    tokio::spawn(async move {
        let result = pipeline.run_drill_down(&request).await;
        if tx.send((request.table, result)).await.is_err() {
            debug!("Viewer closed before the lookup finished");
        }
    });
}

/// Copies text to the clipboard and reports the outcome.
fn yank(app: &mut App, text: &str) {
    match clipboard::copy(text) {
        Ok(()) => app.notify(format!("Yanked: {}", preview(text))),
        Err(e) => app.notify_error(&GridError::internal(format!("Clipboard: {e}"))),
    }
}

/// First line of `text`, shortened for a notification.
pub(crate) fn preview(text: &str) -> String {
    const MAX: usize = 40;
    let first = text.lines().next().unwrap_or_default();
    if first.chars().count() > MAX {
        format!("{}…", first.chars().take(MAX - 1).collect::<String>())
    } else {
        first.to_string()
    }
}

/// Opens the interactive viewer over a query result.
pub async fn run(viewer: GridViewer, pipeline: Pipeline) -> Result<()> {
    let mut tui = Tui::new()?;
    tui.run(App::new(viewer), pipeline).await
}
