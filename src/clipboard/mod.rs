//! Clipboard capture types and the source abstraction
//!
//! A platform backend classifies whatever the system clipboard holds into a
//! [`Capture`] and hands it on. Decoding native clipboard formats happens in
//! the backend, never here.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::history::EntryKind;

/// One or more filesystem paths, as delivered by a clipboard backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paths {
    /// A single path
    One(PathBuf),
    /// An ordered list of paths
    Many(Vec<PathBuf>),
}

impl Paths {
    /// View the paths as a slice, regardless of shape
    pub fn as_slice(&self) -> &[PathBuf] {
        match self {
            Paths::One(path) => std::slice::from_ref(path),
            Paths::Many(paths) => paths,
        }
    }

    /// Normalize into an ordered list
    pub fn into_vec(self) -> Vec<PathBuf> {
        match self {
            Paths::One(path) => vec![path],
            Paths::Many(paths) => paths,
        }
    }
}

impl From<PathBuf> for Paths {
    fn from(path: PathBuf) -> Self {
        Paths::One(path)
    }
}

impl From<&Path> for Paths {
    fn from(path: &Path) -> Self {
        Paths::One(path.to_path_buf())
    }
}

impl From<&str> for Paths {
    fn from(path: &str) -> Self {
        Paths::One(PathBuf::from(path))
    }
}

impl From<Vec<PathBuf>> for Paths {
    fn from(paths: Vec<PathBuf>) -> Self {
        Paths::Many(paths)
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for Paths {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Paths::Many(iter.into_iter().map(Into::into).collect())
    }
}

/// A classified clipboard item, ready to be recorded
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    /// Plain text
    Text(String),
    /// Raw image bytes (PNG as delivered by the backend)
    Image(Vec<u8>),
    /// References to audio files
    AudioFile(Paths),
    /// References to arbitrary files
    Files(Paths),
    /// Anything the backend could not classify, passed through as-is
    Unknown(serde_json::Value),
}

impl Capture {
    /// Create a text capture
    pub fn text(text: impl Into<String>) -> Self {
        Capture::Text(text.into())
    }

    /// Create an image capture
    pub fn image(bytes: impl Into<Vec<u8>>) -> Self {
        Capture::Image(bytes.into())
    }

    /// Create an audio file capture from one path or many
    pub fn audio_file(paths: impl Into<Paths>) -> Self {
        Capture::AudioFile(paths.into())
    }

    /// Create a file list capture from one path or many
    pub fn files(paths: impl Into<Paths>) -> Self {
        Capture::Files(paths.into())
    }

    /// The history kind this capture will be recorded as
    pub fn kind(&self) -> EntryKind {
        match self {
            Capture::Text(_) => EntryKind::Text,
            Capture::Image(_) => EntryKind::Image,
            Capture::AudioFile(_) => EntryKind::AudioFile,
            Capture::Files(_) => EntryKind::Files,
            Capture::Unknown(_) => EntryKind::Unknown,
        }
    }

    /// Get content as text if possible
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Capture::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Clipboard errors
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Platform-specific error
    #[error("Platform error: {0}")]
    Platform(String),

    /// Unsupported content type
    #[error("Unsupported content type: {0}")]
    UnsupportedType(EntryKind),

    /// No content available
    #[error("No clipboard content available")]
    NoContent,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Clipboard backend that produces captures and accepts write-backs
#[async_trait]
pub trait ClipboardSource: Send + Sync {
    /// Read and classify the current clipboard content
    async fn read(&self) -> Result<Capture, ClipboardError>;

    /// Replace the clipboard content
    async fn write(&self, content: &Capture) -> Result<(), ClipboardError>;

    /// Get provider name
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_path_normalizes_to_one_element() {
        let capture = Capture::files("/tmp/report.pdf");
        match capture {
            Capture::Files(paths) => {
                assert_eq!(paths.into_vec(), vec![PathBuf::from("/tmp/report.pdf")]);
            }
            other => panic!("unexpected capture: {:?}", other),
        }
    }

    #[test]
    fn test_many_paths_keep_order() {
        let paths: Paths = ["/b.wav", "/a.wav"].into_iter().collect();
        assert_eq!(
            paths.as_slice(),
            &[PathBuf::from("/b.wav"), PathBuf::from("/a.wav")]
        );
    }

    #[test]
    fn test_capture_kind() {
        assert_eq!(Capture::text("hi").kind(), EntryKind::Text);
        assert_eq!(Capture::image(vec![1, 2]).kind(), EntryKind::Image);
        assert_eq!(Capture::audio_file("/x.mp3").kind(), EntryKind::AudioFile);
        assert_eq!(
            Capture::Unknown(serde_json::Value::Null).kind(),
            EntryKind::Unknown
        );
        assert_eq!(Capture::text("hi").as_text(), Some("hi"));
        assert_eq!(Capture::image(vec![1]).as_text(), None);
    }
}
