// src/models/mod.rs

//! Domain models for the watcher application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod feed;
mod slot;
mod snapshot;

// Re-export all public types
pub use config::{Config, HttpConfig, RetryConfig, StoreBackend, StoreConfig};
pub use feed::Feed;
pub use slot::{Slot, SlotKey};
pub use snapshot::{Snapshot, Status};
