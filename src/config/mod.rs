//! Configuration management for ClipStash
//!
//! This module handles loading, validating, and managing configuration
//! for the history store and the capture handler.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::history::store::{DEFAULT_MAX_ENTRIES, DEFAULT_PREVIEW_CHARS};

const MAX_ENTRIES_LIMIT: usize = 100_000;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Failed to write TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Validation error
    #[error("Config validation failed: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// History store configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Where transforms write their output files
    #[serde(default)]
    pub output: OutputConfig,

    /// Text replacement applied by the capture handler
    #[serde(default)]
    pub replace: ReplaceConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// History store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Directory holding the index file and image blobs
    #[serde(default = "default_history_dir")]
    pub dir: PathBuf,

    /// Number of entries kept before the oldest is evicted
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Text length past which a preview is stored
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

/// Transform output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for copied images and audio
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

/// Text replacement configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaceConfig {
    /// `search:replace` pairs separated by commas; empty disables replacement
    #[serde(default)]
    pub pairs: String,
}

// Default value functions
fn default_history_dir() -> PathBuf {
    PathBuf::from("~/.local/share/clipstash/clipboard_history")
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("~/.local/share/clipstash/clipboard_output")
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: default_history_dir(),
            max_entries: default_max_entries(),
            preview_chars: default_preview_chars(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            output: OutputConfig::default(),
            replace: ReplaceConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Checks in order:
    /// 1. Path from CLIPSTASH_CONFIG environment variable
    /// 2. ~/.config/clipstash/config.toml
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => {
                let mut config = Self::default();
                config.expand_paths();
                Ok(config)
            }
        }
    }

    /// Load configuration with an optional explicit path
    pub fn load_config(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load_from_path(path);
        }
        let mut config = Self::default();
        config.expand_paths();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml_str)?;
        config.expand_paths();
        config.validate_config()?;
        Ok(config)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("clipstash").join("config.toml"))
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CLIPSTASH_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        Self::default_path().filter(|p| p.exists())
    }

    /// Expand tilde in paths
    fn expand_paths(&mut self) {
        self.history.dir = expand_path(&self.history.dir);
        self.output.dir = expand_path(&self.output.dir);
    }

    /// Validate configuration values
    fn validate_config(&self) -> Result<(), ConfigError> {
        if self.history.max_entries < 1 {
            return Err(ConfigError::Validation(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.history.max_entries > MAX_ENTRIES_LIMIT {
            return Err(ConfigError::Validation(format!(
                "max_entries must not exceed {}",
                MAX_ENTRIES_LIMIT
            )));
        }
        if self.history.preview_chars < 1 {
            return Err(ConfigError::Validation(
                "preview_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Write an example configuration to `path`
    pub fn write_example(path: &Path, force: bool) -> Result<(), ConfigError> {
        if !force && path.exists() {
            return Err(ConfigError::Validation(
                "Config file already exists. Use --force to overwrite.".to_string(),
            ));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::generate_example())?;
        Ok(())
    }

    /// Render the current configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate example configuration file
    pub fn generate_example() -> String {
        let config = Config::default();

        format!(
            r#"# ClipStash Configuration File
# Location: ~/.config/clipstash/config.toml

# Logging level (trace, debug, info, warn, error)
log_level = "{}"

# Clipboard history
[history]
# Directory holding history_index.json and image blobs
dir = "{}"
# Entries kept before the oldest is evicted
max_entries = {}
# Texts longer than this get a stored preview
preview_chars = {}

# Transform output
[output]
dir = "{}"

# Text replacement, e.g. "foo:bar,colour:color"
[replace]
pairs = "{}"
"#,
            config.log_level,
            config.history.dir.display(),
            config.history.max_entries,
            config.history.preview_chars,
            config.output.dir.display(),
            config.replace.pairs,
        )
    }
}

/// Expand tilde in path
fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(path_str.as_ref());
    PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.history.max_entries, 1000);
        assert_eq!(config.history.preview_chars, 500);
        assert!(config.replace.pairs.is_empty());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_from_toml() {
        let toml_str = r#"
            log_level = "debug"

            [history]
            dir = "/var/tmp/clips"
            max_entries = 50

            [replace]
            pairs = "teh:the"
        "#;

        let config = Config::from_toml(toml_str).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.history.dir, PathBuf::from("/var/tmp/clips"));
        assert_eq!(config.history.max_entries, 50);
        assert_eq!(config.history.preview_chars, 500);
        assert_eq!(config.replace.pairs, "teh:the");
    }

    #[test]
    fn test_tilde_is_expanded() {
        let config = Config::from_toml("[history]\ndir = \"~/clips\"").unwrap();
        assert!(!config.history.dir.to_string_lossy().starts_with('~'));
        assert!(config.history.dir.ends_with("clips"));
    }

    #[test]
    fn test_validation_max_entries() {
        assert!(Config::from_toml("[history]\nmax_entries = 0").is_err());
        assert!(Config::from_toml("[history]\nmax_entries = 100001").is_err());
        assert!(Config::from_toml("[history]\nmax_entries = 100000").is_ok());
    }

    #[test]
    fn test_validation_preview_chars() {
        let result = Config::from_toml("[history]\npreview_chars = 0");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_write_example_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clipstash").join("config.toml");

        Config::write_example(&path, false).unwrap();
        assert!(Config::write_example(&path, false).is_err());
        Config::write_example(&path, true).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.history.max_entries, 1000);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");

        let config = Config::load_or_default(&missing).unwrap();
        assert_eq!(config.history.max_entries, DEFAULT_MAX_ENTRIES);
        assert!(!config.history.dir.to_string_lossy().starts_with('~'));
        assert!(Config::load_from_path(&missing).is_err());
    }

    #[test]
    fn test_generate_example() {
        let example = Config::generate_example();
        assert!(example.contains("ClipStash Configuration"));
        assert!(example.contains("max_entries = 1000"));
        assert!(Config::from_toml(&example).is_ok());
    }
}
