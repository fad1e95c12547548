//! db-grid: run named SQL queries through the database's command-line
//! client and browse the results in a terminal grid.
//!
//! This library exposes the core modules for the binary and for
//! integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod fk;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod safety;
pub mod table;
pub mod tui;
pub mod viewer;
