//! Application state for the TUI.
//!
//! Holds the stack of open grid viewers and translates key presses into
//! viewer commands. Anything that has to leave the process (running a
//! drill-down query, writing the clipboard) is returned as an [`AppAction`]
//! for the caller to carry out.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use super::widgets::spinner::Spinner;
use super::widgets::toast::ToastKind;
use crate::error::{GridError, Result};
use crate::pipeline::QueryOutcome;
use crate::viewer::{DrillDownRequest, GridViewer};

/// Lines outside the grid: the title bar and the prompt line.
pub const FRAME_ROWS: u16 = 2;

/// Largest accepted repeat count.
const MAX_COUNT: usize = 99_999;

/// Input mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing a search term after `/`.
    Search(String),
}

/// A notification shown until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: ToastKind,
}

/// Work the caller must perform after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    None,
    /// Run the lookup query and push a viewer over its result.
    DrillDown(DrillDownRequest),
    /// Copy text to the clipboard.
    Yank(String),
    /// The last viewer was closed.
    Quit,
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    /// Open viewers; the last one is active.
    viewers: Vec<GridViewer>,
    pub mode: Mode,
    /// Pending repeat count typed before a motion.
    pub count: Option<usize>,
    pub notification: Option<Notification>,
    /// Set while a drill-down query runs.
    pub busy: Option<Spinner>,
    /// Text of the last yank.
    pub last_yank: Option<String>,
    pub running: bool,
    width: u16,
    height: u16,
}

impl App {
    /// Creates the application with its first viewer.
    pub fn new(viewer: GridViewer) -> Self {
        Self {
            viewers: vec![viewer],
            mode: Mode::Normal,
            count: None,
            notification: None,
            busy: None,
            last_yank: None,
            running: true,
            width: 80,
            height: 24,
        }
    }

    /// The viewer receiving commands.
    pub fn active(&self) -> Option<&GridViewer> {
        self.viewers.last()
    }

    fn active_mut(&mut self) -> Option<&mut GridViewer> {
        self.viewers.last_mut()
    }

    /// Number of open viewers.
    pub fn depth(&self) -> usize {
        self.viewers.len()
    }

    /// Records the terminal size and resizes every viewer's grid area.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let grid_height = height.saturating_sub(FRAME_ROWS) as usize;
        for viewer in &mut self.viewers {
            viewer.set_viewport(width as usize, grid_height);
        }
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification {
            message: message.into(),
            kind: ToastKind::Info,
        });
    }

    pub fn notify_error(&mut self, err: &GridError) {
        let kind = if err.is_benign() {
            ToastKind::Info
        } else {
            ToastKind::Error
        };
        self.notification = Some(Notification {
            message: err.to_string(),
            kind,
        });
    }

    /// Marks a drill-down as started.
    pub fn start_drill_down(&mut self, request: &DrillDownRequest) {
        self.busy = Some(Spinner::new(format!("Looking up {}", request.table)));
    }

    /// Pushes a viewer over the drill-down result, or reports the failure
    /// and leaves the current viewer active.
    pub fn finish_drill_down(&mut self, title: &str, result: Result<QueryOutcome>) {
        self.busy = None;
        match result {
            Ok(outcome) => {
                let column_width = self
                    .active()
                    .map(GridViewer::column_width)
                    .unwrap_or(crate::viewer::DEFAULT_COLUMN_WIDTH);
                let mut viewer = GridViewer::new(title, outcome, column_width);
                viewer.set_viewport(
                    self.width as usize,
                    self.height.saturating_sub(FRAME_ROWS) as usize,
                );
                self.viewers.push(viewer);
                debug!(depth = self.viewers.len(), "Opened drill-down viewer");
            }
            Err(e) => self.notify_error(&e),
        }
    }

    /// Handles a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.viewers.clear();
            self.running = false;
            return AppAction::Quit;
        }

        // No commands while a query is in flight
        if self.busy.is_some() {
            return AppAction::None;
        }

        self.notification = None;

        match std::mem::take(&mut self.mode) {
            Mode::Search(term) => self.handle_search_key(term, key),
            Mode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_search_key(&mut self, mut term: String, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Enter => {
                let Some(viewer) = self.active_mut() else {
                    return AppAction::None;
                };
                let matches = viewer.search(&term);
                if matches == 0 {
                    self.notify(format!("Pattern not found: {term}"));
                } else {
                    self.notify(format!("{matches} matches for '{term}'"));
                }
            }
            KeyCode::Esc => {}
            KeyCode::Backspace => {
                if term.pop().is_some() {
                    self.mode = Mode::Search(term);
                }
            }
            KeyCode::Char(c) => {
                term.push(c);
                self.mode = Mode::Search(term);
            }
            _ => self.mode = Mode::Search(term),
        }
        AppAction::None
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> AppAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        // Count prefix; a leading 0 means "first column"
        if let KeyCode::Char(c @ '0'..='9') = key.code {
            if !ctrl && (c != '0' || self.count.is_some()) {
                let digit = c as usize - '0' as usize;
                let count = self.count.unwrap_or(0) * 10 + digit;
                self.count = Some(count.min(MAX_COUNT));
                return AppAction::None;
            }
        }

        let explicit_count = self.count.take();
        let count = explicit_count.unwrap_or(1);
        let Some(viewer) = self.viewers.last_mut() else {
            self.running = false;
            return AppAction::Quit;
        };

        match key.code {
            KeyCode::Char('d') if ctrl => viewer.page_down(count),
            KeyCode::Char('u') if ctrl => viewer.page_up(count),
            KeyCode::PageDown => viewer.page_down(count),
            KeyCode::PageUp => viewer.page_up(count),
            KeyCode::Char('j') | KeyCode::Down => viewer.move_rows(1, count),
            KeyCode::Char('k') | KeyCode::Up => viewer.move_rows(-1, count),
            KeyCode::Char('l') | KeyCode::Right => viewer.move_cols(1, count),
            KeyCode::Char('h') | KeyCode::Left => viewer.move_cols(-1, count),
            KeyCode::Char('g') => viewer.first_row(),
            KeyCode::Char('G') => match explicit_count {
                Some(row) => {
                    let col = viewer.state().current_col;
                    viewer.jump_to(row, col);
                }
                None => viewer.last_row(),
            },
            KeyCode::Char('0') | KeyCode::Char('^') | KeyCode::Home => viewer.first_col(),
            KeyCode::Char('$') | KeyCode::End => viewer.last_col(),
            KeyCode::Char('/') => self.mode = Mode::Search(String::new()),
            KeyCode::Char('n') | KeyCode::Char('N') => {
                let found = if key.code == KeyCode::Char('n') {
                    viewer.next_match()
                } else {
                    viewer.prev_match()
                };
                if found.is_none() {
                    self.notify("No search matches");
                }
            }
            KeyCode::Enter | KeyCode::Char('f') => match viewer.drill_down() {
                Ok(request) => return AppAction::DrillDown(request),
                Err(e) => self.notify_error(&e),
            },
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let text = if key.code == KeyCode::Char('y') {
                    viewer.yank_cell()
                } else {
                    viewer.yank_row()
                };
                match text {
                    Some(text) => {
                        self.last_yank = Some(text.clone());
                        return AppAction::Yank(text);
                    }
                    None => self.notify("Nothing to yank"),
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                self.viewers.pop();
                if self.viewers.is_empty() {
                    self.running = false;
                    return AppAction::Quit;
                }
            }
            _ => {}
        }
        AppAction::None
    }
}
