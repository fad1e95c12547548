//! Title bar widget for the TUI.
//!
//! Shows the query name, the tables it reads from and the database the
//! result came from.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Title bar widget.
pub struct Header<'a> {
    title: &'a str,
    tables: &'a [String],
    db_info: &'a str,
    depth: usize,
}

impl<'a> Header<'a> {
    /// Creates a new title bar.
    pub fn new(title: &'a str, tables: &'a [String], db_info: &'a str, depth: usize) -> Self {
        Self {
            title,
            tables,
            db_info,
            depth,
        }
    }

    /// Left-hand text: query name, drill-down depth and query tables.
    pub fn left_text(&self) -> String {
        let mut text = format!(" {}", self.title);
        if self.depth > 1 {
            text.push_str(&format!(" [{}]", self.depth));
        }
        if !self.tables.is_empty() {
            text.push_str(&format!(" ({})", self.tables.join(", ")));
        }
        text
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left_span = Span::styled(self.left_text(), style);
        buf.set_span(area.x, area.y, &left_span, area.width);

        let right_text = format!(" [db: {}] ", self.db_info);
        let right_width = right_text.chars().count() as u16;
        let left_width = self.left_text().chars().count() as u16;
        if left_width + right_width < area.width {
            let right_x = area.right().saturating_sub(right_width);
            let right_style = Style::default().bg(Color::Blue).fg(Color::Gray);
            buf.set_string(right_x, area.y, &right_text, right_style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_text() {
        let tables = vec!["orders".to_string(), "users".to_string()];
        let header = Header::new("Recent orders", &tables, "postgresql://h/app", 1);
        assert_eq!(header.left_text(), " Recent orders (orders, users)");

        let header = Header::new("users", &[], "postgresql://h/app", 3);
        assert_eq!(header.left_text(), " users [3]");
    }

    #[test]
    fn test_render_includes_db_info() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        Header::new("q", &[], "sqlite://app.db", 1).render(area, &mut buf);
        let line: String = (0..60).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(line.starts_with(" q "));
        assert!(line.trim_end().ends_with("[db: sqlite://app.db]"));
    }
}
