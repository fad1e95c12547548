//! Result grid widget for the TUI.
//!
//! Renders the visible window of a [`GridViewer`] as a bordered grid with
//! fixed-width columns, a highlighted cursor cell, foreign-key markers and a
//! one-line status footer.

use crate::fk::ForeignKeyMap;
use crate::viewer::{visible_cols_for, visible_rows_for, GridViewer};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Prefix marking a foreign-key column, on headers and cells alike.
pub const FK_MARKER: &str = "→";

const ELLIPSIS: char = '…';

/// Widget for rendering the grid of the active viewer.
pub struct GridTable<'a> {
    viewer: &'a GridViewer,
    status_override: Option<String>,
}

impl<'a> GridTable<'a> {
    /// Creates a new grid widget.
    pub fn new(viewer: &'a GridViewer) -> Self {
        Self {
            viewer,
            status_override: None,
        }
    }

    /// Replaces the status footer, e.g. with a busy indicator.
    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status_override = status;
        self
    }

    /// Fits text into exactly `width` display columns: truncated with an
    /// ellipsis when too wide, right-padded otherwise. Wide characters count
    /// as two columns.
    pub fn fit(text: &str, width: usize) -> String {
        let text_width = text.width();
        if text_width <= width {
            return format!("{text}{}", " ".repeat(width - text_width));
        }
        if width == 0 {
            return String::new();
        }

        let budget = width - 1;
        let mut out = String::new();
        let mut used = 0;
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > budget {
                break;
            }
            out.push(c);
            used += w;
        }
        out.push(ELLIPSIS);
        out.push_str(&" ".repeat(budget - used));
        out
    }

    fn marked(text: &str, col: usize, fk: &ForeignKeyMap) -> String {
        if fk.contains_key(&col) {
            format!("{FK_MARKER}{text}")
        } else {
            text.to_string()
        }
    }

    /// Renders the grid to lines for a `width` x `height` area.
    pub fn render_to_lines(&self, width: usize, height: usize) -> Vec<Line<'static>> {
        let viewer = self.viewer;
        let table = viewer.table();
        let state = viewer.state();
        let fk = &viewer.fk().columns;
        let cw = viewer.column_width();

        let col_start = state.h_offset.min(table.column_count().saturating_sub(1));
        let col_end = (col_start + visible_cols_for(width, cw)).min(table.column_count());
        let row_start = state.v_offset.min(table.rows.len());
        let row_end = (row_start + visible_rows_for(height)).min(table.rows.len());
        let cols: Vec<usize> = (col_start..col_end).collect();

        let mut lines = Vec::new();
        lines.push(Self::border(cols.len(), cw, '┌', '┬', '┐'));

        // Header row
        let mut spans = vec![Self::bar()];
        for &c in &cols {
            let style = if fk.contains_key(&(c + 1)) {
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            };
            let name = Self::marked(&table.headers[c], c + 1, fk);
            spans.push(Span::styled(format!(" {} ", Self::fit(&name, cw)), style));
            spans.push(Self::bar());
        }
        lines.push(Line::from(spans));

        lines.push(Self::border(cols.len(), cw, '├', '┼', '┤'));

        for r in row_start..row_end {
            let row = &table.rows[r];
            let is_current_row = r + 1 == state.current_row;
            let mut spans = vec![Self::bar()];
            for &c in &cols {
                let text = Self::marked(&row[c], c + 1, fk);
                let is_match = state.last_search.matches.contains(&(r + 1, c + 1));
                let mut style = Style::default();
                if fk.contains_key(&(c + 1)) {
                    style = style.fg(Color::Magenta);
                }
                if is_match {
                    style = style.fg(Color::Black).bg(Color::Yellow);
                }
                if is_current_row {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if is_current_row && c + 1 == state.current_col {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                spans.push(Span::styled(format!(" {} ", Self::fit(&text, cw)), style));
                spans.push(Self::bar());
            }
            lines.push(Line::from(spans));
        }

        lines.push(Self::border(cols.len(), cw, '└', '┴', '┘'));

        let status = self.status_override.clone().unwrap_or_else(|| {
            Self::status_text(viewer, (row_start, row_end), (col_start, col_end))
        });
        lines.push(Line::from(Span::styled(
            status,
            Style::default().fg(Color::DarkGray),
        )));

        lines
    }

    /// Position, visible range and totals.
    fn status_text(viewer: &GridViewer, rows: (usize, usize), cols: (usize, usize)) -> String {
        let table = viewer.table();
        let state = viewer.state();
        let total_rows = table.rows.len();
        let total_cols = table.column_count();
        let current_row = if total_rows == 0 { 0 } else { state.current_row };
        let range = |(start, end): (usize, usize)| {
            if end > start {
                format!("{}-{}", start + 1, end)
            } else {
                "0-0".to_string()
            }
        };

        let mut status = format!(
            " Row {current_row}/{total_rows}, Col {}/{total_cols} │ rows {}, cols {} │ {} rows x {total_cols} cols",
            state.current_col,
            range(rows),
            range(cols),
            table.row_count,
        );
        if let Some(timing) = &table.timing {
            status.push_str(&format!(" │ {timing}"));
        }
        let search = &state.last_search;
        if !search.term.is_empty() {
            if search.matches.is_empty() {
                status.push_str(&format!(" │ /{} 0/0", search.term));
            } else {
                status.push_str(&format!(
                    " │ /{} {}/{}",
                    search.term,
                    search.cursor + 1,
                    search.matches.len()
                ));
            }
        }
        status
    }

    fn bar() -> Span<'static> {
        Span::styled("│", Style::default().fg(Color::DarkGray))
    }

    /// Renders a horizontal border line.
    fn border(cols: usize, width: usize, left: char, mid: char, right: char) -> Line<'static> {
        let mut border = String::new();
        border.push(left);
        for i in 0..cols {
            border.push_str(&"─".repeat(width + 2));
            if i + 1 < cols {
                border.push(mid);
            }
        }
        border.push(right);

        Line::from(Span::styled(border, Style::default().fg(Color::DarkGray)))
    }
}

impl Widget for GridTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.render_to_lines(area.width as usize, area.height as usize);

        for (i, line) in lines.iter().enumerate() {
            if i >= area.height as usize {
                break;
            }
            let y = area.y + i as u16;
            buf.set_line(area.x, y, line, area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseContext;
    use crate::fk::{Confidence, FkAnalysis, ForeignKeyInfo};
    use crate::pipeline::QueryOutcome;
    use crate::table::ParsedTable;
    use std::time::Duration;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn viewer() -> GridViewer {
        let table = ParsedTable::new(
            strings(&["id", "user_id", "comment"]),
            vec![
                strings(&["1", "7", "short"]),
                strings(&["2", "8", "a comment that is far too long"]),
                strings(&["3", "9", "x"]),
            ],
        );
        let fk = FkAnalysis {
            columns: ForeignKeyMap::from([(
                2,
                ForeignKeyInfo {
                    column_index: 2,
                    column_name: "user_id".to_string(),
                    referenced_table: Some("users".to_string()),
                    referenced_column: "id".to_string(),
                    confidence: Confidence::Medium,
                },
            )]),
            query_tables: vec!["posts".to_string()],
        };
        let outcome = QueryOutcome {
            table,
            fk,
            context: DatabaseContext::new("sqlite://app.db").unwrap(),
            execution_time: Duration::ZERO,
        };
        let mut viewer = GridViewer::new("posts", outcome, 8);
        viewer.set_viewport(80, 10);
        viewer
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_fit() {
        assert_eq!(GridTable::fit("abc", 5), "abc  ");
        assert_eq!(GridTable::fit("abcdef", 5), "abcd…");
        assert_eq!(GridTable::fit("abcde", 5), "abcde");
        assert_eq!(GridTable::fit("zürich!", 6), "züric…");
    }

    #[test]
    fn test_fit_wide_characters() {
        assert_eq!(GridTable::fit("東京", 6), "東京  ");
        assert_eq!(GridTable::fit("東京都庁", 6), "東京… ");
        assert_eq!(GridTable::fit("東京都庁", 6).width(), 6);
        assert_eq!(GridTable::fit("ab東", 3), "ab…");
    }

    #[test]
    fn test_render_layout() {
        let viewer = viewer();
        let lines = GridTable::new(&viewer).render_to_lines(80, 10);

        // top border, header, separator, 3 rows, bottom border, status
        assert_eq!(lines.len(), 8);
        assert_eq!(text(&lines[0]), "┌──────────┬──────────┬──────────┐");
        assert_eq!(text(&lines[1]), "│ id       │ →user_id │ comment  │");
        assert_eq!(text(&lines[4]), "│ 2        │ →8       │ a comme… │");
        assert_eq!(text(&lines[6]), "└──────────┴──────────┴──────────┘");
    }

    #[test]
    fn test_status_line() {
        let mut viewer = viewer();
        viewer.jump_to(2, 3);
        viewer.search("x");
        let lines = GridTable::new(&viewer).render_to_lines(80, 10);
        let status = text(lines.last().unwrap());
        assert!(status.contains("Row 3/3, Col 3/3"), "{status}");
        assert!(status.contains("rows 1-3, cols 1-3"), "{status}");
        assert!(status.contains("3 rows x 3 cols"), "{status}");
        assert!(status.contains("/x 1/1"), "{status}");
    }

    #[test]
    fn test_window_follows_offsets() {
        let mut viewer = viewer();
        // 20 wide: one 8-char column fits
        viewer.set_viewport(20, 6);
        viewer.jump_to(3, 3);
        let lines = GridTable::new(&viewer).render_to_lines(20, 6);

        assert_eq!(lines.len(), 6);
        assert_eq!(text(&lines[1]), "│ comment  │");
        assert_eq!(text(&lines[3]), "│ x        │");
        assert!(text(&lines[5]).contains("rows 3-3, cols 3-3"));
    }

    #[test]
    fn test_status_override() {
        let viewer = viewer();
        let lines = GridTable::new(&viewer)
            .with_status(Some("⠋ Following user_id".to_string()))
            .render_to_lines(80, 10);
        assert_eq!(text(lines.last().unwrap()), "⠋ Following user_id");
    }
}
