#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tiered draft storage with debounced autosave.
//!
//! A visitor's half-finished form must survive a reload even when one
//! storage mechanism is blocked by privacy settings. Reads try an ordered
//! list of backends and take the first hit; writes go to every backend.
//! Rapid successive edits collapse into a single trailing write via
//! [`Debouncer`], so only the final value within the quiet window is
//! guaranteed persisted.

mod backend;
mod debounce;
mod persistence;

pub use backend::{FileBackend, MemoryBackend, StorageBackend, TieredStore};
pub use debounce::Debouncer;
pub use persistence::{FormPersistence, PersistenceOptions};

use thiserror::Error;

/// Errors from storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data failed to serialize or parse.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
