//! Notification toast for the TUI.
//!
//! Shows the outcome of the last command (yank, search, failed drill-down)
//! in the bottom-right corner until the next key press.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Info,
    Error,
}

/// Toast notification widget.
pub struct Toast<'a> {
    message: &'a str,
    kind: ToastKind,
}

impl<'a> Toast<'a> {
    /// Creates a new toast widget.
    pub fn new(message: &'a str, kind: ToastKind) -> Self {
        Self { message, kind }
    }

    /// Calculates the area for the toast (bottom-right corner, above the
    /// prompt line).
    pub fn area(screen: Rect) -> Rect {
        let width = 60.min(screen.width.saturating_sub(4));
        let height = 3.min(screen.height);
        let x = screen.x + screen.width.saturating_sub(width + 2);
        let y = screen.y + screen.height.saturating_sub(height + 1);
        Rect::new(x, y, width, height)
    }
}

impl Widget for Toast<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let color = match self.kind {
            ToastKind::Info => Color::Green,
            ToastKind::Error => Color::Red,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(Color::Black));

        let inner = block.inner(area);
        block.render(area, buf);

        let max_len = inner.width as usize;
        let display_msg = if self.message.chars().count() > max_len {
            let mut msg: String = self.message.chars().take(max_len.saturating_sub(1)).collect();
            msg.push('…');
            msg
        } else {
            self.message.to_string()
        };

        let line = Line::from(vec![Span::styled(
            display_msg,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )]);

        Paragraph::new(line).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_area() {
        let screen = Rect::new(0, 0, 80, 24);
        let area = Toast::area(screen);
        assert!(area.x > 0);
        assert!(area.y > 0);
        assert_eq!(area.height, 3);
        assert_eq!(area.width, 60);
    }

    #[test]
    fn test_long_message_is_truncated() {
        let area = Rect::new(0, 0, 12, 3);
        let mut buf = Buffer::empty(area);
        Toast::new("a very long notification", ToastKind::Error).render(area, &mut buf);

        let middle: String = (0..12).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert_eq!(middle, "│a very lo…│");
    }
}
