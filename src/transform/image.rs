//! Image color extraction seam and image file copying

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use super::TransformError;

/// Extensions treated as images when files are copied
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// A dominant color found in an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// Share of the image covered, 0.0 to 1.0
    pub area: f32,
}

impl Color {
    /// `#rrggbb` form
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Palette extraction backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ColorExtractor: Send + Sync {
    /// Extract dominant colors from encoded image bytes
    async fn extract(&self, image: &[u8]) -> Result<Vec<Color>, TransformError>;
}

/// Keep only paths with a known image extension
pub fn image_files(paths: &[PathBuf]) -> Vec<&Path> {
    paths
        .iter()
        .map(PathBuf::as_path)
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect()
}

/// Write raw image bytes into `out_dir` as `clipboard_image_<millis>.png`
pub async fn save_image(bytes: &[u8], out_dir: &Path) -> Result<PathBuf, TransformError> {
    let dest = out_dir.join(format!(
        "clipboard_image_{}.png",
        chrono::Utc::now().timestamp_millis()
    ));
    let copy_err = |source: std::io::Error| TransformError::Copy {
        from: PathBuf::from("<clipboard>"),
        to: dest.clone(),
        source,
    };
    fs::create_dir_all(out_dir).await.map_err(copy_err)?;
    fs::write(&dest, bytes).await.map_err(copy_err)?;
    info!("Image saved: {:?}", dest);
    Ok(dest)
}

/// Copy the image files among `paths` into `out_dir`, keeping file names
///
/// Returns the destination paths. Non-image paths are ignored.
pub async fn copy_image_files(
    paths: &[PathBuf],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, TransformError> {
    let images = image_files(paths);
    if images.is_empty() {
        info!("No image files found in clipboard data");
        return Ok(Vec::new());
    }

    fs::create_dir_all(out_dir)
        .await
        .map_err(|source| TransformError::Copy {
            from: PathBuf::new(),
            to: out_dir.to_path_buf(),
            source,
        })?;

    let mut copied = Vec::with_capacity(images.len());
    for source_path in images {
        let Some(name) = source_path.file_name() else {
            continue;
        };
        let dest = out_dir.join(name);
        fs::copy(source_path, &dest)
            .await
            .map_err(|source| TransformError::Copy {
                from: source_path.to_path_buf(),
                to: dest.clone(),
                source,
            })?;
        info!("Image saved: {:?}", dest);
        copied.push(dest);
    }
    Ok(copied)
}
