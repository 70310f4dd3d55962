//! Capture handler: record every capture, then run its transform
//!
//! This is what a clipboard monitor calls for each new item. Recording
//! failures and transform failures are logged and never abort handling.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clipboard::{Capture, ClipboardError, ClipboardSource};
use crate::history::HistoryStore;
use crate::transform::{
    copy_image_files, replace_text, save_image, transcribe_first, ColorExtractor, Replacement,
    Transcriber,
};

/// Routes captures to the history store and the configured transforms
pub struct CaptureHandler {
    history: Arc<HistoryStore>,
    output_dir: PathBuf,
    replacements: Vec<Replacement>,
    transcriber: Option<Arc<dyn Transcriber>>,
    color_extractor: Option<Arc<dyn ColorExtractor>>,
}

impl CaptureHandler {
    pub fn new(history: Arc<HistoryStore>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            history,
            output_dir: output_dir.into(),
            replacements: Vec::new(),
            transcriber: None,
            color_extractor: None,
        }
    }

    /// Rewrite copied text with these rules
    pub fn with_replacements(mut self, replacements: Vec<Replacement>) -> Self {
        self.replacements = replacements;
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_color_extractor(mut self, extractor: Arc<dyn ColorExtractor>) -> Self {
        self.color_extractor = Some(extractor);
        self
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Read the clipboard once, handle it and write back any result
    pub async fn handle_source(&self, source: &dyn ClipboardSource) -> Result<(), ClipboardError> {
        let capture = source.read().await?;
        if let Some(content) = self.process(capture).await {
            source.write(&content).await?;
            info!("Wrote {} result back via {}", content.kind(), source.name());
        }
        Ok(())
    }

    /// Handle one capture
    ///
    /// Returns content that should be written back to the clipboard, if
    /// the transform produced any.
    pub async fn process(&self, capture: Capture) -> Option<Capture> {
        if let Err(e) = self.history.add_entry(capture.clone()).await {
            error!("Error adding to clipboard history: {}", e);
        }

        match capture {
            Capture::AudioFile(paths) => {
                let transcriber = self.transcriber.as_ref()?;
                let transcript =
                    transcribe_first(transcriber.as_ref(), paths.as_slice(), &self.output_dir)
                        .await;
                match transcript {
                    Ok(text) => {
                        info!("Transcription completed: {}", text);
                        Some(Capture::Text(text))
                    }
                    Err(e) => {
                        warn!("Error processing audio file: {}", e);
                        None
                    }
                }
            }
            Capture::Text(text) => {
                if self.replacements.is_empty() {
                    info!("Text copied: {}", text);
                    return None;
                }
                Some(Capture::Text(replace_text(&text, &self.replacements)))
            }
            Capture::Image(bytes) => {
                if let Err(e) = save_image(&bytes, &self.output_dir).await {
                    warn!("Error processing image: {}", e);
                }
                let extractor = self.color_extractor.as_ref()?;
                match extractor.extract(&bytes).await {
                    Ok(colors) => {
                        let palette: Vec<String> = colors.iter().map(|c| c.hex()).collect();
                        info!("Extracted colors: {}", palette.join(", "));
                    }
                    Err(e) => warn!("Error extracting colors: {}", e),
                }
                None
            }
            Capture::Files(paths) => {
                info!("Files copied: {}", paths.as_slice().len());
                if let Err(e) = copy_image_files(paths.as_slice(), &self.output_dir).await {
                    warn!("Error processing image: {}", e);
                }
                None
            }
            Capture::Unknown(_) => {
                info!("Unknown content copied");
                None
            }
        }
    }
}
