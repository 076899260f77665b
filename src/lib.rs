// src/lib.rs

//! akimachi watcher library

pub mod diff;
pub mod error;
pub mod fetch;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod store;
pub mod utils;
