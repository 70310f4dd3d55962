//! History entries and their on-disk JSON shape

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::clipboard::Capture;

/// Marker appended to truncated text previews
pub const PREVIEW_ELLIPSIS: &str = "...";

/// Kind of a recorded clipboard item
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum EntryKind {
    Text,
    Image,
    AudioFile,
    Files,
    Unknown,
}

impl EntryKind {
    /// Tag used in the index file
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Text => "text",
            EntryKind::Image => "image",
            EntryKind::AudioFile => "audio_file",
            EntryKind::Files => "files",
            EntryKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored payload, one shape per kind
#[derive(Debug, Clone, PartialEq)]
pub enum EntryData {
    /// The captured string
    Text(String),
    /// Blob filename, relative to the history directory
    Image { file: String },
    /// Absolute source paths of audio files
    AudioFile(Vec<PathBuf>),
    /// Absolute source paths of copied files
    Files(Vec<PathBuf>),
    /// Unclassified payload, kept verbatim
    Unknown(Value),
}

impl EntryData {
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryData::Text(_) => EntryKind::Text,
            EntryData::Image { .. } => EntryKind::Image,
            EntryData::AudioFile(_) => EntryKind::AudioFile,
            EntryData::Files(_) => EntryKind::Files,
            EntryData::Unknown(_) => EntryKind::Unknown,
        }
    }

    /// Blob filename for image entries, if it names a plain file
    ///
    /// Names with directory components resolve to nothing, keeping blob
    /// cleanup inside the history directory.
    pub fn blob_file(&self) -> Option<&str> {
        match self {
            EntryData::Image { file } => {
                let name = Path::new(file).file_name()?;
                (name == file.as_str()).then_some(file.as_str())
            }
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EntryData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn paths(&self) -> Option<&[PathBuf]> {
        match self {
            EntryData::AudioFile(paths) | EntryData::Files(paths) => Some(paths),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            EntryData::Text(text) => Value::String(text.clone()),
            EntryData::Image { file } => Value::String(file.clone()),
            EntryData::AudioFile(paths) | EntryData::Files(paths) => Value::Array(
                paths
                    .iter()
                    .map(|p| Value::String(p.to_string_lossy().into_owned()))
                    .collect(),
            ),
            EntryData::Unknown(value) => value.clone(),
        }
    }

    fn from_value(kind: EntryKind, value: Value) -> Result<Self, EntryFormatError> {
        let data = match kind {
            EntryKind::Text => EntryData::Text(expect_string(kind, value)?),
            EntryKind::Image => EntryData::Image {
                file: expect_string(kind, value)?,
            },
            EntryKind::AudioFile => EntryData::AudioFile(expect_paths(kind, value)?),
            EntryKind::Files => EntryData::Files(expect_paths(kind, value)?),
            EntryKind::Unknown => EntryData::Unknown(value),
        };
        Ok(data)
    }
}

fn expect_string(kind: EntryKind, value: Value) -> Result<String, EntryFormatError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(EntryFormatError::Data {
            kind,
            expected: "a string",
        }),
    }
}

fn expect_paths(kind: EntryKind, value: Value) -> Result<Vec<PathBuf>, EntryFormatError> {
    serde_json::from_value(value).map_err(|_| EntryFormatError::Data {
        kind,
        expected: "a list of paths",
    })
}

/// Facts derived from the payload at capture time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Byte length of an image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Number of referenced paths
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Referenced paths, used by search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<PathBuf>>,
    /// Character length of a text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    /// Leading characters of a long text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl Metadata {
    pub fn for_image(size: usize) -> Self {
        Self {
            size: Some(size as u64),
            ..Self::default()
        }
    }

    pub fn for_paths(paths: &[PathBuf]) -> Self {
        Self {
            count: Some(paths.len()),
            paths: Some(paths.to_vec()),
            ..Self::default()
        }
    }

    /// Text metadata; a preview is attached only past `preview_chars`
    pub fn for_text(text: &str, preview_chars: usize) -> Self {
        let length = text.chars().count();
        let preview = (length > preview_chars).then(|| {
            let mut preview: String = text.chars().take(preview_chars).collect();
            preview.push_str(PREVIEW_ELLIPSIS);
            preview
        });
        Self {
            length: Some(length),
            preview,
            ..Self::default()
        }
    }
}

/// One recorded clipboard capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct Entry {
    /// `<timestamp>-<hash>` identifier
    pub id: String,
    /// Capture time, millisecond precision
    pub timestamp: DateTime<Utc>,
    pub data: EntryData,
    pub metadata: Metadata,
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        self.data.kind()
    }

    /// Case-insensitive substring match; `needle` must already be lowercase
    ///
    /// Text matches on its content, anything carrying paths on any path.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        if let EntryData::Text(text) = &self.data {
            return text.to_lowercase().contains(needle);
        }
        match &self.metadata.paths {
            Some(paths) => paths
                .iter()
                .any(|p| p.to_string_lossy().to_lowercase().contains(needle)),
            None => false,
        }
    }

    /// Short single-line description for listings
    pub fn summary(&self, width: usize) -> String {
        let full = match &self.data {
            EntryData::Text(text) => text.replace('\n', " "),
            EntryData::Image { file } => match self.metadata.size {
                Some(size) => format!("{} ({} bytes)", file, size),
                None => file.clone(),
            },
            EntryData::AudioFile(paths) | EntryData::Files(paths) => paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            EntryData::Unknown(value) => value.to_string(),
        };
        if full.chars().count() > width {
            let head: String = full.chars().take(width).collect();
            format!("{}{}", head, PREVIEW_ELLIPSIS)
        } else {
            full
        }
    }
}

/// Errors raised while decoding an index entry
#[derive(Debug, Error)]
pub enum EntryFormatError {
    #[error("invalid timestamp {0:?}")]
    Timestamp(String),

    #[error("{kind} entry data must be {expected}")]
    Data {
        kind: EntryKind,
        expected: &'static str,
    },
}

/// Entry as laid out in the index file
#[derive(Serialize, Deserialize)]
struct RawEntry {
    id: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    timestamp: String,
    data: Value,
    #[serde(default)]
    metadata: Metadata,
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> Self {
        Self {
            kind: entry.kind(),
            data: entry.data.to_value(),
            id: entry.id,
            timestamp: format_timestamp(entry.timestamp),
            metadata: entry.metadata,
        }
    }
}

impl TryFrom<RawEntry> for Entry {
    type Error = EntryFormatError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let timestamp = DateTime::parse_from_rfc3339(&raw.timestamp)
            .map_err(|_| EntryFormatError::Timestamp(raw.timestamp.clone()))?
            .with_timezone(&Utc);
        Ok(Self {
            id: raw.id,
            timestamp,
            data: EntryData::from_value(raw.kind, raw.data)?,
            metadata: raw.metadata,
        })
    }
}

/// ISO-8601 with milliseconds and a `Z` suffix
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build an id from the capture instant and a hash of the capture
///
/// The id keeps the `:` separators of the ISO timestamp, so blob names
/// derived from it are not valid file names on Windows.
pub(crate) fn generate_id(at: DateTime<Utc>, capture: &Capture) -> String {
    format!("{}-{}", format_timestamp(at), content_hash(capture))
}

/// First 8 hex characters of a SHA-256 over the kind tag and payload
pub(crate) fn content_hash(capture: &Capture) -> String {
    let mut hasher = Sha256::new();
    hasher.update(capture.kind().as_str().as_bytes());
    hasher.update([0u8]);
    match capture {
        Capture::Text(text) => hasher.update(text.as_bytes()),
        Capture::Image(bytes) => hasher.update(bytes),
        Capture::AudioFile(paths) | Capture::Files(paths) => {
            for path in paths.as_slice() {
                hasher.update(path.as_os_str().as_encoded_bytes());
                hasher.update([0u8]);
            }
        }
        Capture::Unknown(value) => hasher.update(value.to_string().as_bytes()),
    }
    hex::encode(&hasher.finalize()[..4])
}
