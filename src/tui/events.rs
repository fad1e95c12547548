//! Event handling for the TUI.
//!
//! Terminal input is read on a dedicated thread and forwarded over a
//! channel, so the async loop can wait for a key and a finished query at
//! the same time.

use crate::error::{GridError, Result};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Application events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
    /// A periodic tick (spinner animation).
    Tick,
}

/// Handles terminal events.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Starts reading terminal events with the default tick rate.
    pub fn new() -> Self {
        Self::with_tick_rate(Duration::from_millis(100))
    }

    /// Starts reading terminal events, emitting a tick whenever nothing
    /// arrives within `tick_rate`.
    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || loop {
            match poll_once(tick_rate) {
                Ok(Some(event)) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Stopped reading terminal events: {}", e);
                    break;
                }
            }
        });
        Self { rx }
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| GridError::internal("Terminal event stream closed"))
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls for one event. Key releases and repeats are dropped.
fn poll_once(tick_rate: Duration) -> Result<Option<Event>> {
    if !event::poll(tick_rate)
        .map_err(|e| GridError::internal(format!("Failed to poll events: {e}")))?
    {
        return Ok(Some(Event::Tick));
    }

    let event =
        event::read().map_err(|e| GridError::internal(format!("Failed to read event: {e}")))?;

    Ok(translate(event))
}

fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Key(_) => None,
        CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
        _ => Some(Event::Tick),
    }
}
