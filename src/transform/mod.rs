//! Stateless transforms applied to captured content
//!
//! None of these touch the history store. The capture handler runs them
//! after recording and may turn their output into a new capture.

pub mod image;
pub mod replace;
pub mod transcript;

use std::path::PathBuf;

use thiserror::Error;

pub use image::{copy_image_files, image_files, save_image, Color, ColorExtractor};
pub use replace::{parse_replacements, replace_text, Replacement};
pub use transcript::{copy_audio_file, extract_transcript_text, transcribe_first, Transcriber};

/// Transform errors
#[derive(Debug, Error)]
pub enum TransformError {
    /// No usable `search:replace` pair in the input
    #[error("No valid replacement pairs found")]
    NoReplacements,

    /// A search pattern is not a valid regex
    #[error("Invalid search pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Every audio source failed to transcribe
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Color extraction failed
    #[error("Color extraction failed: {0}")]
    ColorExtraction(String),

    /// A file could not be copied
    #[error("Failed to copy {from:?} to {to:?}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
