//! UI rendering for the TUI.
//!
//! Layout: title bar, the active viewer's grid, and a prompt line for the
//! search prompt and key hints. Notifications float above as a toast.

use super::app::{App, Mode};
use super::widgets::{grid::GridTable, header::Header, toast::Toast};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const KEY_HINTS: &str =
    " hjkl move  ^d/^u page  / search  n/N next/prev  f follow  y/Y yank  q close";

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(1),    // Grid
            Constraint::Length(1), // Prompt
        ])
        .split(area);

    let Some(viewer) = app.active() else {
        return;
    };

    let db_info = viewer.context().display_string();
    frame.render_widget(
        Header::new(viewer.title(), &viewer.fk().query_tables, &db_info, app.depth()),
        layout[0],
    );

    let busy = app.busy.as_ref().map(|spinner| spinner.display());
    frame.render_widget(GridTable::new(viewer).with_status(busy), layout[1]);

    render_prompt(frame, layout[2], app);

    if let Some(note) = &app.notification {
        frame.render_widget(Toast::new(&note.message, note.kind), Toast::area(area));
    }
}

/// Renders the search prompt or the key hints.
fn render_prompt(frame: &mut Frame, area: Rect, app: &App) {
    match &app.mode {
        Mode::Search(term) => {
            let line = Line::from(vec![
                Span::styled("/", Style::default().fg(Color::Yellow)),
                Span::raw(term.clone()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            let cursor_x = area.x + 1 + term.chars().count() as u16;
            frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(1)), area.y));
        }
        Mode::Normal => {
            let mut text = KEY_HINTS.to_string();
            if let Some(count) = app.count {
                text = format!(" {count}{text}");
            }
            frame.render_widget(
                Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray))),
                area,
            );
        }
    }
}
