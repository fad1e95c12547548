//! TUI widgets for dbgrid.

pub mod grid;
pub mod header;
pub mod spinner;
pub mod toast;
