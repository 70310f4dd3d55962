//! # ClipStash
//!
//! Persistent clipboard history for captured text, images, audio files and
//! file lists.
//!
//! The core is [`history::HistoryStore`]: a bounded, newest-first index
//! mirrored to a JSON file, with images stored as side blobs. Everything
//! else in the crate feeds it (the [`clipboard`] capture types and the
//! [`handler`]) or runs next to it (the stateless [`transform`]s).

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod handler;
pub mod history;
pub mod transform;

pub use clipboard::Capture;
pub use config::Config;
pub use history::{Entry, EntryData, EntryKind, HistoryStore};

/// Result type alias for ClipStash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ClipStash operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// History store error
    #[error("History error: {0}")]
    History(#[from] history::HistoryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Clipboard operation error
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] clipboard::ClipboardError),

    /// Transform error
    #[error("Transform error: {0}")]
    Transform(#[from] transform::TransformError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
