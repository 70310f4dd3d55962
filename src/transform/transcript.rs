//! Audio transcription seam and transcript cleanup

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;
use tracing::{info, warn};

use super::TransformError;

/// Speech-to-text backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio file into raw subtitle-style output
    async fn transcribe(&self, audio: &Path) -> Result<String, TransformError>;
}

static TIMESTAMP_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\d{2}:\d{2}:\d{2}\.\d{3} --> \d{2}:\d{2}:\d{2}\.\d{3}\]").unwrap()
});

/// Strip `[hh:mm:ss.mmm --> hh:mm:ss.mmm]` markers and join lines
pub fn extract_transcript_text(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| TIMESTAMP_MARKER.replace(line, "").trim().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Copy an audio file into `out_dir` as `clipboard_<millis>.<ext>`
pub async fn copy_audio_file(source: &Path, out_dir: &Path) -> Result<PathBuf, TransformError> {
    let name = match source.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("clipboard_{}.{}", chrono::Utc::now().timestamp_millis(), ext),
        None => format!("clipboard_{}", chrono::Utc::now().timestamp_millis()),
    };
    let dest = out_dir.join(name);
    let copy_err = |source_err: std::io::Error| TransformError::Copy {
        from: source.to_path_buf(),
        to: dest.clone(),
        source: source_err,
    };

    fs::create_dir_all(out_dir).await.map_err(copy_err)?;
    let size = fs::copy(source, &dest).await.map_err(copy_err)?;
    info!("Audio file saved: {:?}", dest);
    info!("Size: {:.2} MB", size as f64 / 1024.0 / 1024.0);
    Ok(dest)
}

/// Copy each source into `out_dir` and transcribe the copy
///
/// Returns the first clean transcript. A source that fails to copy aborts
/// the run; a failed transcription moves on to the next source.
pub async fn transcribe_first(
    transcriber: &dyn Transcriber,
    sources: &[PathBuf],
    out_dir: &Path,
) -> Result<String, TransformError> {
    for source in sources {
        let copy = copy_audio_file(source, out_dir).await?;
        info!("Transcribing {:?}", copy);
        match transcriber.transcribe(&copy).await {
            Ok(raw) => return Ok(extract_transcript_text(&raw)),
            Err(e) => warn!("Failed to transcribe {:?}: {}", source, e),
        }
    }
    Err(TransformError::Transcription(format!(
        "no transcribable audio among {} source(s)",
        sources.len()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::function;
    use tempfile::TempDir;

    #[test]
    fn test_extract_transcript_text() {
        let raw = "\n[00:00:00.000 --> 00:00:02.500]   Hello there.\n\n[00:00:02.500 --> 00:00:04.000] General Kenobi!\n";
        assert_eq!(extract_transcript_text(raw), "Hello there. General Kenobi!");
    }

    #[test]
    fn test_plain_lines_pass_through() {
        assert_eq!(extract_transcript_text("one\ntwo"), "one two");
        assert_eq!(extract_transcript_text(""), "");
    }

    fn audio_sources(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, b"RIFF audio").unwrap();
                path
            })
            .collect()
    }

    fn has_extension(ext: &'static str) -> impl Fn(&Path) -> bool {
        move |path: &Path| path.extension().and_then(|e| e.to_str()) == Some(ext)
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let sources = audio_sources(src.path(), &["a.mp3", "b.wav"]);

        let mut transcriber = MockTranscriber::new();
        transcriber
            .expect_transcribe()
            .with(function(has_extension("mp3")))
            .returning(|_| Err(TransformError::Transcription("bad codec".into())));
        transcriber
            .expect_transcribe()
            .with(function(has_extension("wav")))
            .returning(|_| Ok("[00:00:00.000 --> 00:00:01.000] hi".into()));

        let text = transcribe_first(&transcriber, &sources, out.path())
            .await
            .unwrap();
        assert_eq!(text, "hi");
    }

    #[tokio::test]
    async fn test_transcribes_the_copy() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let sources = audio_sources(src.path(), &["memo.m4a"]);
        let out_dir = out.path().to_path_buf();

        let mut transcriber = MockTranscriber::new();
        transcriber
            .expect_transcribe()
            .withf(move |path| path.starts_with(&out_dir))
            .times(1)
            .returning(|_| Ok("copied".into()));

        let text = transcribe_first(&transcriber, &sources, out.path())
            .await
            .unwrap();
        assert_eq!(text, "copied");
    }

    #[tokio::test]
    async fn test_all_failures_is_an_error() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let sources = audio_sources(src.path(), &["a.mp3"]);

        let mut transcriber = MockTranscriber::new();
        transcriber
            .expect_transcribe()
            .returning(|_| Err(TransformError::Transcription("nope".into())));

        let result = transcribe_first(&transcriber, &sources, out.path()).await;
        assert!(matches!(result, Err(TransformError::Transcription(_))));
    }

    #[tokio::test]
    async fn test_missing_source_fails_to_copy() {
        let out = TempDir::new().unwrap();
        let mut transcriber = MockTranscriber::new();
        transcriber.expect_transcribe().never();

        let result =
            transcribe_first(&transcriber, &[PathBuf::from("/no/such/a.mp3")], out.path()).await;
        assert!(matches!(result, Err(TransformError::Copy { .. })));
    }

    #[tokio::test]
    async fn test_copy_audio_file() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let sources = audio_sources(src.path(), &["voice.ogg"]);
        let out_dir = out.path().join("clipboard_output");

        let dest = copy_audio_file(&sources[0], &out_dir).await.unwrap();

        assert_eq!(dest.parent(), Some(out_dir.as_path()));
        let name = dest.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("clipboard_") && name.ends_with(".ogg"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"RIFF audio");
        assert!(sources[0].exists());
    }
}
