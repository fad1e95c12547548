//! Library-level integration tests.

pub mod config_test;
pub mod pipeline_test;
pub mod sqlite_test;
pub mod viewer_test;
