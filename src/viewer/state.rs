//! Cursor, scroll and search state of one grid viewer.

use serde::Serialize;

/// Most recent search and the position within its matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchState {
    pub term: String,
    /// 1-based `(row, col)` positions in row-major order.
    pub matches: Vec<(usize, usize)>,
    /// Index into `matches` of the current match.
    pub cursor: usize,
}

impl SearchState {
    /// Moves to the next match, wrapping past the last one.
    pub fn next(&mut self) -> Option<(usize, usize)> {
        if self.matches.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.matches.len();
        self.matches.get(self.cursor).copied()
    }

    /// Moves to the previous match, wrapping past the first one.
    pub fn prev(&mut self) -> Option<(usize, usize)> {
        if self.matches.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + self.matches.len() - 1) % self.matches.len();
        self.matches.get(self.cursor).copied()
    }

    pub fn current(&self) -> Option<(usize, usize)> {
        self.matches.get(self.cursor).copied()
    }
}

/// Cursor and scroll position.
///
/// `current_row` and `current_col` are 1-based; offsets count the rows and
/// columns scrolled out of view above and to the left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridViewState {
    pub current_row: usize,
    pub current_col: usize,
    pub h_offset: usize,
    pub v_offset: usize,
    pub last_search: SearchState,
}

impl Default for GridViewState {
    fn default() -> Self {
        Self {
            current_row: 1,
            current_col: 1,
            h_offset: 0,
            v_offset: 0,
            last_search: SearchState::default(),
        }
    }
}

/// Adjusts `offset` so that the 1-based `position` lies inside a window of
/// `span` items. The offset only moves when the position is outside.
pub(crate) fn scroll_to_show(offset: usize, position: usize, span: usize) -> usize {
    let span = span.max(1);
    if position <= offset {
        position.saturating_sub(1)
    } else if position > offset + span {
        position - span
    } else {
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_matches() -> SearchState {
        SearchState {
            term: "a".to_string(),
            matches: vec![(1, 1), (2, 3), (4, 2)],
            cursor: 0,
        }
    }

    #[test]
    fn test_next_wraps_around() {
        let mut search = three_matches();
        assert_eq!(search.next(), Some((2, 3)));
        assert_eq!(search.next(), Some((4, 2)));
        assert_eq!(search.next(), Some((1, 1)));
        assert_eq!(search.next(), Some((2, 3)));
    }

    #[test]
    fn test_prev_from_first_lands_on_last() {
        let mut search = three_matches();
        assert_eq!(search.prev(), Some((4, 2)));
    }

    #[test]
    fn test_no_matches() {
        let mut search = SearchState::default();
        assert_eq!(search.next(), None);
        assert_eq!(search.prev(), None);
        assert_eq!(search.current(), None);
    }

    #[test]
    fn test_scroll_to_show() {
        // inside the window: unchanged
        assert_eq!(scroll_to_show(0, 3, 5), 0);
        assert_eq!(scroll_to_show(2, 7, 5), 2);
        // below the window
        assert_eq!(scroll_to_show(0, 6, 5), 1);
        assert_eq!(scroll_to_show(0, 100, 5), 95);
        // above the window
        assert_eq!(scroll_to_show(10, 4, 5), 3);
        assert_eq!(scroll_to_show(10, 1, 5), 0);
    }
}
