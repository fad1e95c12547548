//! Clipboard support for yanked cells and rows.
//!
//! Tries the native clipboard (arboard) first, then platform tools, and
//! falls back to the OSC 52 escape sequence, which most terminals forward
//! to the system clipboard.

use arboard::Clipboard;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use thiserror::Error;

/// Native clipboard, kept open for the lifetime of the TUI.
static CLIPBOARD: Mutex<Option<Clipboard>> = Mutex::new(None);

/// Selected backend.
static BACKEND: Mutex<Option<ClipboardBackend>> = Mutex::new(None);

/// Clipboard backend for the current platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardBackend {
    Arboard,
    /// External command reading the text on stdin (xclip, xsel, pbcopy).
    Command(&'static str, &'static [&'static str]),
    Osc52,
}

/// Clipboard operation errors.
#[derive(Debug, Clone, Error)]
pub enum ClipboardError {
    #[error("Failed to initialize clipboard: {0}")]
    Init(String),
    #[error("Failed to acquire clipboard lock")]
    Lock,
    #[error("Clipboard not initialized")]
    NotInitialized,
    #[error("Failed to copy to clipboard: {0}")]
    Copy(String),
}

/// Copy commands tried in order when arboard is unavailable.
const COPY_COMMANDS: &[(&str, &[&str])] = &[
    #[cfg(target_os = "macos")]
    ("pbcopy", &[]),
    #[cfg(target_os = "linux")]
    ("xclip", &["-selection", "clipboard"]),
    #[cfg(target_os = "linux")]
    ("xsel", &["--clipboard", "--input"]),
];

fn detect_backend() -> ClipboardBackend {
    if Clipboard::new().is_ok() {
        return ClipboardBackend::Arboard;
    }

    COPY_COMMANDS
        .iter()
        .find(|(program, _)| crate::db::find_executable(program).is_some())
        .map(|&(program, args)| ClipboardBackend::Command(program, args))
        .unwrap_or(ClipboardBackend::Osc52)
}

/// Picks a backend. Call once when the TUI starts.
pub fn init() -> Result<ClipboardBackend, ClipboardError> {
    let backend = detect_backend();

    if let Ok(mut guard) = BACKEND.lock() {
        *guard = Some(backend);
    }

    if backend == ClipboardBackend::Arboard {
        let clipboard = Clipboard::new().map_err(|e| ClipboardError::Init(e.to_string()))?;
        let mut guard = CLIPBOARD.lock().map_err(|_| ClipboardError::Lock)?;
        *guard = Some(clipboard);
    }

    Ok(backend)
}

fn backend() -> Option<ClipboardBackend> {
    BACKEND.lock().ok().and_then(|g| *g)
}

/// Copies text to the clipboard using the selected backend.
pub fn copy(text: &str) -> Result<(), ClipboardError> {
    match backend().unwrap_or_else(detect_backend) {
        ClipboardBackend::Arboard => copy_arboard(text),
        ClipboardBackend::Command(program, args) => copy_command(program, args, text),
        ClipboardBackend::Osc52 => copy_osc52(text),
    }
}

fn copy_arboard(text: &str) -> Result<(), ClipboardError> {
    let mut guard = CLIPBOARD.lock().map_err(|_| ClipboardError::Lock)?;
    let clipboard = guard.as_mut().ok_or(ClipboardError::NotInitialized)?;
    clipboard
        .set_text(text)
        .map_err(|e| ClipboardError::Copy(e.to_string()))
}

fn copy_command(program: &str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClipboardError::Copy(format!("Failed to spawn {program}: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| ClipboardError::Copy(format!("Failed to write to {program}: {e}")))?;
    }

    child
        .wait()
        .map_err(|e| ClipboardError::Copy(format!("{program} failed: {e}")))?;

    Ok(())
}

/// OSC 52 sequence that asks the terminal to set the clipboard.
pub fn osc52_sequence(text: &str) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};

    format!("\x1b]52;c;{}\x1b\\", STANDARD.encode(text))
}

fn copy_osc52(text: &str) -> Result<(), ClipboardError> {
    let mut stdout = std::io::stdout();
    stdout
        .write_all(osc52_sequence(text).as_bytes())
        .and_then(|_| stdout.flush())
        .map_err(|e| ClipboardError::Copy(format!("Failed to write OSC 52: {e}")))
}
