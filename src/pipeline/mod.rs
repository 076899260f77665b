//! Pipeline entry points for watcher operations.
//!
//! - `run_check`: One fetch→diff→notify→save run for a single feed
//! - `run_all`: Sequential runs over every configured feed

pub mod run;

pub use run::{RunReport, run_all, run_check};
