//! Interactive grid viewer over a parsed result table.
//!
//! The viewer holds the table, its foreign-key annotations, the database
//! context that produced it and the cursor/scroll/search state. Every
//! command is a plain method so the terminal loop and headless mode drive
//! it the same way.

mod state;

pub use state::{GridViewState, SearchState};

use tracing::debug;

use crate::db::DatabaseContext;
use crate::error::{GridError, Result};
use crate::fk::{FkAnalysis, ForeignKeyInfo};
use crate::pipeline::QueryOutcome;
use crate::query::sql_literal;
use crate::table::ParsedTable;
use state::scroll_to_show;

/// Lines of the grid area not used for data rows: top border, header,
/// header separator, bottom border and status line.
pub const CHROME_ROWS: usize = 5;

/// Characters each column takes beyond its content width: a space on each
/// side and the right border.
pub const COLUMN_PADDING: usize = 3;

/// Default fixed column width.
pub const DEFAULT_COLUMN_WIDTH: usize = 20;

/// Cell text that never starts a drill-down.
const NULL_MARKER: &str = "NULL";

/// Columns of `column_width` that fit in `width`, counting the left border.
pub fn visible_cols_for(width: usize, column_width: usize) -> usize {
    (width.saturating_sub(1) / (column_width + COLUMN_PADDING)).max(1)
}

pub fn visible_rows_for(height: usize) -> usize {
    height.saturating_sub(CHROME_ROWS).max(1)
}

/// Query to run when following a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillDownRequest {
    pub sql: String,
    /// Table being looked up, used as the new viewer's title.
    pub table: String,
    /// Database the current table came from.
    pub context: DatabaseContext,
}

/// Navigation, search and drill-down over one result table.
#[derive(Debug, Clone)]
pub struct GridViewer {
    title: String,
    table: ParsedTable,
    fk: FkAnalysis,
    context: DatabaseContext,
    state: GridViewState,
    column_width: usize,
    width: usize,
    height: usize,
}

impl GridViewer {
    /// Opens a viewer over a query outcome.
    pub fn new(title: impl Into<String>, outcome: QueryOutcome, column_width: usize) -> Self {
        Self {
            title: title.into(),
            table: outcome.table,
            fk: outcome.fk,
            context: outcome.context,
            state: GridViewState::default(),
            column_width: column_width.max(1),
            width: 80,
            height: 24,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn table(&self) -> &ParsedTable {
        &self.table
    }

    pub fn fk(&self) -> &FkAnalysis {
        &self.fk
    }

    pub fn context(&self) -> &DatabaseContext {
        &self.context
    }

    pub fn state(&self) -> &GridViewState {
        &self.state
    }

    pub fn column_width(&self) -> usize {
        self.column_width
    }

    /// Sets the size of the grid area and keeps the cursor visible.
    ///
    /// Offsets are pulled back when the window grows past the end of the
    /// table, so a larger window fills with rows instead of blank space.
    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let max_v = self.table.rows.len().saturating_sub(self.visible_rows());
        let max_h = self.table.column_count().saturating_sub(self.visible_cols());
        self.state.v_offset = self.state.v_offset.min(max_v);
        self.state.h_offset = self.state.h_offset.min(max_h);
        self.scroll_into_view();
    }

    /// Number of columns that fit in the grid area (at least one).
    pub fn visible_cols(&self) -> usize {
        visible_cols_for(self.width, self.column_width)
    }

    /// Number of data rows that fit in the grid area (at least one).
    pub fn visible_rows(&self) -> usize {
        visible_rows_for(self.height)
    }

    fn row_count(&self) -> usize {
        self.table.rows.len().max(1)
    }

    fn col_count(&self) -> usize {
        self.table.column_count().max(1)
    }

    fn scroll_into_view(&mut self) {
        let rows = self.visible_rows();
        let cols = self.visible_cols();
        self.state.v_offset = scroll_to_show(self.state.v_offset, self.state.current_row, rows);
        self.state.h_offset = scroll_to_show(self.state.h_offset, self.state.current_col, cols);
    }

    /// Moves the cursor to a 1-based position, clamped to the table.
    pub fn jump_to(&mut self, row: usize, col: usize) {
        self.state.current_row = row.clamp(1, self.row_count());
        self.state.current_col = col.clamp(1, self.col_count());
        self.scroll_into_view();
    }

    /// Moves the cursor `count` rows down (positive) or up (negative).
    pub fn move_rows(&mut self, delta: isize, count: usize) {
        let steps = delta.saturating_mul(count.max(1) as isize);
        let row = self.state.current_row.saturating_add_signed(steps);
        self.jump_to(row, self.state.current_col);
    }

    /// Moves the cursor `count` columns right (positive) or left (negative).
    pub fn move_cols(&mut self, delta: isize, count: usize) {
        let steps = delta.saturating_mul(count.max(1) as isize);
        let col = self.state.current_col.saturating_add_signed(steps);
        self.jump_to(self.state.current_row, col);
    }

    pub fn page_down(&mut self, count: usize) {
        self.move_rows(self.visible_rows() as isize, count);
    }

    pub fn page_up(&mut self, count: usize) {
        self.move_rows(-(self.visible_rows() as isize), count);
    }

    pub fn first_row(&mut self) {
        self.jump_to(1, self.state.current_col);
    }

    pub fn last_row(&mut self) {
        self.jump_to(self.row_count(), self.state.current_col);
    }

    pub fn first_col(&mut self) {
        self.jump_to(self.state.current_row, 1);
    }

    pub fn last_col(&mut self) {
        self.jump_to(self.state.current_row, self.col_count());
    }

    /// Searches every cell for `term`, case-insensitively, and jumps to the
    /// first match. Returns the number of matches.
    pub fn search(&mut self, term: &str) -> usize {
        let needle = term.to_lowercase();
        let matches: Vec<(usize, usize)> = if needle.is_empty() {
            Vec::new()
        } else {
            self.table
                .rows
                .iter()
                .enumerate()
                .flat_map(|(r, row)| {
                    row.iter()
                        .enumerate()
                        .filter(|(_, cell)| cell.to_lowercase().contains(&needle))
                        .map(move |(c, _)| (r + 1, c + 1))
                })
                .collect()
        };

        debug!(term, matches = matches.len(), "Search");
        self.state.last_search = SearchState {
            term: term.to_string(),
            matches,
            cursor: 0,
        };

        if let Some((row, col)) = self.state.last_search.current() {
            self.jump_to(row, col);
        }
        self.state.last_search.matches.len()
    }

    /// Jumps to the next match of the last search.
    pub fn next_match(&mut self) -> Option<(usize, usize)> {
        let (row, col) = self.state.last_search.next()?;
        self.jump_to(row, col);
        Some((row, col))
    }

    /// Jumps to the previous match of the last search.
    pub fn prev_match(&mut self) -> Option<(usize, usize)> {
        let (row, col) = self.state.last_search.prev()?;
        self.jump_to(row, col);
        Some((row, col))
    }

    /// Value under the cursor, if the table has one there.
    pub fn current_cell(&self) -> Option<&str> {
        self.table.cell(self.state.current_row, self.state.current_col)
    }

    pub fn current_header(&self) -> Option<&str> {
        self.table.header(self.state.current_col)
    }

    /// Foreign-key annotation of the column under the cursor.
    pub fn current_fk(&self) -> Option<&ForeignKeyInfo> {
        self.fk.columns.get(&self.state.current_col)
    }

    /// Builds the lookup query for the foreign key under the cursor.
    pub fn drill_down(&self) -> Result<DrillDownRequest> {
        let header = self.current_header().unwrap_or_default();
        let info = self
            .current_fk()
            .ok_or_else(|| GridError::drill_down(format!("column '{header}' is not a foreign key")))?;
        let table = info.referenced_table.as_deref().ok_or_else(|| {
            GridError::drill_down(format!("no referenced table for column '{header}'"))
        })?;

        let value = self
            .current_cell()
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != NULL_MARKER)
            .ok_or_else(|| GridError::drill_down("empty cell value"))?;

        let sql = format!(
            "SELECT * FROM {table} WHERE {} = {} LIMIT 1;",
            info.referenced_column,
            sql_literal(value)
        );
        debug!(sql = %sql, "Drill-down query");

        Ok(DrillDownRequest {
            sql,
            table: table.to_string(),
            context: self.context.clone(),
        })
    }

    /// `"<header>: <cell>"` for the cell under the cursor.
    pub fn yank_cell(&self) -> Option<String> {
        let header = self.current_header()?;
        let cell = self.current_cell()?;
        Some(format!("{header}: {cell}"))
    }

    /// One `"<header>: <cell>"` line per column of the current row.
    pub fn yank_row(&self) -> Option<String> {
        let row = self.table.rows.get(self.state.current_row.checked_sub(1)?)?;
        let lines: Vec<String> = self
            .table
            .headers
            .iter()
            .zip(row)
            .map(|(header, cell)| format!("{header}: {cell}"))
            .collect();
        Some(lines.join("\n"))
    }
}
