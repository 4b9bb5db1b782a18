//! File-backed journal of trades and quarterly trading theses.
//!
//! Entities live as individual JSON documents under a data directory:
//! `trades/<year>/`, `theses/`, `screenshots/` and `settings.json`.
//! [`Journal`] owns the stores for one such directory; [`commands`] wraps
//! its operations in the [`commands::ApiResponse`] envelope.

pub mod analytics;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod journal;
pub mod models;
pub mod storage;
pub mod view;

#[cfg(test)]
mod test_support;

pub use config::JournalConfig;
pub use error::{EntityKind, ErrorKind, StoreError, StoreResult};
pub use journal::Journal;
