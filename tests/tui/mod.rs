//! Tests that drive the `dbgrid` binary.

pub mod common;
pub mod headless_test;
