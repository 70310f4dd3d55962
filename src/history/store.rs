//! JSON-file history store with side-stored image blobs

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{SubsecRound, Utc};
use tokio::fs;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, warn};

use super::entry::{generate_id, Entry, EntryData, EntryKind, Metadata};
use super::HistoryError;
use crate::clipboard::Capture;
use crate::config::HistoryConfig;

/// Name of the index file inside the history directory
pub const INDEX_FILE_NAME: &str = "history_index.json";
pub const DEFAULT_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_PREVIEW_CHARS: usize = 500;
const BLOB_EXTENSION: &str = "png";

/// Outcome of best-effort blob deletion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cleanup {
    /// Blob files that were deleted
    pub removed: Vec<PathBuf>,
    /// Blob files that could not be deleted
    pub failures: Vec<CleanupFailure>,
}

impl Cleanup {
    /// True when every attempted deletion succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A blob that outlived its entry
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Everything that happened while recording one capture
#[derive(Debug, Clone)]
pub struct Recorded {
    /// The new entry
    pub entry: Entry,
    /// Entries pushed out by the capacity bound, oldest first
    pub evicted: Vec<Entry>,
    /// Blob cleanup for the evicted entries
    pub cleanup: Cleanup,
}

/// Bounded, newest-first clipboard history
///
/// The index is loaded lazily on first use and rewritten in full after
/// every mutation. Mutations hold the index lock across the whole
/// mutate-then-persist sequence, so concurrent writers never interleave.
pub struct HistoryStore {
    dir: PathBuf,
    index_path: PathBuf,
    max_entries: usize,
    preview_chars: usize,
    initialized: OnceCell<()>,
    index: Mutex<VecDeque<Entry>>,
}

impl HistoryStore {
    /// Create a store rooted at `dir` with default limits
    ///
    /// Nothing touches the filesystem until the first operation.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            index_path: dir.join(INDEX_FILE_NAME),
            dir,
            max_entries: DEFAULT_MAX_ENTRIES,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            initialized: OnceCell::new(),
            index: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a store from the `[history]` configuration section
    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(&config.dir)
            .with_max_entries(config.max_entries)
            .with_preview_chars(config.preview_chars)
    }

    /// Set the capacity bound (at least one entry)
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Set the text length past which a preview is stored
    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Location of an image entry's blob on disk
    pub fn blob_path(&self, entry: &Entry) -> Option<PathBuf> {
        entry.data.blob_file().map(|file| self.dir.join(file))
    }

    /// Load the index once; later calls return immediately
    ///
    /// Concurrent first callers wait on the same load. A failed load
    /// leaves the store uninitialized so the next call retries.
    pub async fn ensure_initialized(&self) -> Result<(), HistoryError> {
        self.initialized.get_or_try_init(|| self.load()).await?;
        Ok(())
    }

    async fn load(&self) -> Result<(), HistoryError> {
        fs::create_dir_all(&self.dir).await.map_err(|source| {
            error!("Failed to initialize clipboard history: {}", source);
            HistoryError::Initialization {
                path: self.dir.clone(),
                source,
            }
        })?;

        let mut index = self.index.lock().await;
        match self.read_index().await {
            Some(entries) => {
                *index = entries;
                let evicted = evict_overflow(&mut index, self.max_entries);
                if !evicted.is_empty() {
                    info!(
                        "Trimming {} history entries over the limit of {}",
                        evicted.len(),
                        self.max_entries
                    );
                    self.remove_blobs(&evicted).await;
                    self.persist(&index).await?;
                }
                info!(
                    "Loaded {} history entries from {:?}",
                    index.len(),
                    self.index_path
                );
            }
            None => {
                index.clear();
                self.persist(&index).await?;
            }
        }
        Ok(())
    }

    /// Read the index file; `None` means start over with an empty history
    async fn read_index(&self) -> Option<VecDeque<Entry>> {
        let contents = match fs::read_to_string(&self.index_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history index at {:?}, starting empty", self.index_path);
                return None;
            }
            Err(e) => {
                warn!(
                    "Failed to read history index {:?}, starting empty: {}",
                    self.index_path, e
                );
                return None;
            }
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&contents) {
            Ok(values) => values,
            Err(e) => {
                warn!(
                    "History index {:?} is corrupt, replacing it: {}",
                    self.index_path, e
                );
                return None;
            }
        };

        Some(decode_entries(values))
    }

    /// Rewrite the whole index file
    async fn persist(&self, index: &VecDeque<Entry>) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(index)?;
        let tmp_path = self.index_path.with_extension("json.tmp");

        fs::write(&tmp_path, json)
            .await
            .map_err(|source| HistoryError::Persistence {
                path: tmp_path.clone(),
                source,
            })?;
        fs::rename(&tmp_path, &self.index_path)
            .await
            .map_err(|source| HistoryError::Persistence {
                path: self.index_path.clone(),
                source,
            })?;

        debug!("Saved {} history entries", index.len());
        Ok(())
    }

    /// Write `<id>.png`; the name carries the id's `:` characters and is not
    /// portable to Windows
    async fn write_blob(&self, id: &str, bytes: &[u8]) -> Result<String, HistoryError> {
        let file = format!("{}.{}", id, BLOB_EXTENSION);
        let path = self.dir.join(&file);
        fs::write(&path, bytes)
            .await
            .map_err(|source| HistoryError::Persistence {
                path: path.clone(),
                source,
            })?;
        Ok(file)
    }

    /// Delete the blobs of `entries`, collecting failures instead of failing
    async fn remove_blobs<'a>(&self, entries: impl IntoIterator<Item = &'a Entry>) -> Cleanup {
        let mut cleanup = Cleanup::default();
        for path in entries.into_iter().filter_map(|e| self.blob_path(e)) {
            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Removed blob {:?}", path);
                    cleanup.removed.push(path);
                }
                Err(e) => {
                    warn!("Failed to remove blob {:?}: {}", path, e);
                    cleanup.failures.push(CleanupFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }
        cleanup
    }

    /// Add a capture to the history and return the new entry
    pub async fn add_entry(&self, capture: Capture) -> Result<Entry, HistoryError> {
        self.record(capture).await.map(|recorded| recorded.entry)
    }

    /// Add a capture, reporting evictions and blob cleanup
    pub async fn record(&self, capture: Capture) -> Result<Recorded, HistoryError> {
        self.ensure_initialized().await?;

        let mut index = self.index.lock().await;
        let result = self.insert(&mut index, capture).await;
        if let Err(e) = &result {
            error!("Failed to add history entry: {}", e);
        }
        result
    }

    async fn insert(
        &self,
        index: &mut VecDeque<Entry>,
        capture: Capture,
    ) -> Result<Recorded, HistoryError> {
        let now = Utc::now().trunc_subsecs(3);
        let id = generate_id(now, &capture);

        let (data, metadata) = match capture {
            Capture::Text(text) => {
                let metadata = Metadata::for_text(&text, self.preview_chars);
                (EntryData::Text(text), metadata)
            }
            Capture::Image(bytes) => {
                let file = self.write_blob(&id, &bytes).await?;
                (EntryData::Image { file }, Metadata::for_image(bytes.len()))
            }
            Capture::AudioFile(paths) => {
                let paths = paths.into_vec();
                let metadata = Metadata::for_paths(&paths);
                (EntryData::AudioFile(paths), metadata)
            }
            Capture::Files(paths) => {
                let paths = paths.into_vec();
                let metadata = Metadata::for_paths(&paths);
                (EntryData::Files(paths), metadata)
            }
            Capture::Unknown(value) => (EntryData::Unknown(value), Metadata::default()),
        };

        let entry = Entry {
            id,
            timestamp: now,
            data,
            metadata,
        };

        index.push_front(entry.clone());
        let evicted = evict_overflow(index, self.max_entries);
        let cleanup = self.remove_blobs(&evicted).await;

        self.persist(index).await?;
        debug!("Recorded {} entry {}", entry.kind(), entry.id);

        Ok(Recorded {
            entry,
            evicted,
            cleanup,
        })
    }

    /// Full history, most recent first
    pub async fn get_history(&self) -> Result<Vec<Entry>, HistoryError> {
        self.ensure_initialized().await?;
        Ok(self.index.lock().await.iter().cloned().collect())
    }

    /// Entries of one kind, most recent first
    pub async fn get_entries_by_type(&self, kind: EntryKind) -> Result<Vec<Entry>, HistoryError> {
        self.ensure_initialized().await?;
        let index = self.index.lock().await;
        Ok(index.iter().filter(|e| e.kind() == kind).cloned().collect())
    }

    /// Case-insensitive substring search over text and paths
    pub async fn search_entries(&self, query: &str) -> Result<Vec<Entry>, HistoryError> {
        self.ensure_initialized().await?;
        let needle = query.to_lowercase();
        let index = self.index.lock().await;
        Ok(index
            .iter()
            .filter(|e| e.matches_lowercase(&needle))
            .cloned()
            .collect())
    }

    /// Look up one entry by id
    pub async fn get_entry(&self, id: &str) -> Result<Option<Entry>, HistoryError> {
        self.ensure_initialized().await?;
        let index = self.index.lock().await;
        Ok(index.iter().find(|e| e.id == id).cloned())
    }

    /// Remove every entry and every image blob
    pub async fn clear_history(&self) -> Result<Cleanup, HistoryError> {
        self.ensure_initialized().await?;

        let mut index = self.index.lock().await;
        let cleanup = self.remove_blobs(index.iter()).await;
        let cleared = index.len();
        index.clear();

        if let Err(e) = self.persist(&index).await {
            error!("Failed to clear history: {}", e);
            return Err(e);
        }
        info!("Cleared {} history entries", cleared);
        Ok(cleanup)
    }

    pub async fn len(&self) -> Result<usize, HistoryError> {
        self.ensure_initialized().await?;
        Ok(self.index.lock().await.len())
    }

    pub async fn is_empty(&self) -> Result<bool, HistoryError> {
        Ok(self.len().await? == 0)
    }
}

/// Decode index records one by one, skipping any that do not fit
fn decode_entries(values: Vec<serde_json::Value>) -> VecDeque<Entry> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable history entry at {}: {}", position, e);
                None
            }
        })
        .collect()
}

/// Pop tail entries until the index fits; returns them oldest first
fn evict_overflow(index: &mut VecDeque<Entry>, max_entries: usize) -> Vec<Entry> {
    let mut evicted = Vec::new();
    while index.len() > max_entries {
        if let Some(oldest) = index.pop_back() {
            evicted.push(oldest);
        }
    }
    evicted
}
