//! Clipboard history management and persistence

pub mod entry;
pub mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use entry::{Entry, EntryData, EntryKind, Metadata};
pub use store::{Cleanup, CleanupFailure, HistoryStore, Recorded};

/// History store errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history directory could not be created
    #[error("Failed to create history directory {path:?}: {source}")]
    Initialization {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index or a blob could not be written
    #[error("Failed to write {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index could not be encoded
    #[error("Failed to encode history index: {0}")]
    Serialize(#[from] serde_json::Error),
}
