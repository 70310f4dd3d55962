//! Command-line interface: argument parsing and command dispatch

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::clipboard::Capture;
use crate::config::Config;
use crate::handler::CaptureHandler;
use crate::history::{Entry, EntryKind, HistoryStore};
use crate::transform::{parse_replacements, replace_text};

pub mod output;

#[derive(Parser)]
#[command(name = "clipstash")]
#[command(about = "Persistent clipboard history")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Record a capture in the history")]
    Add {
        #[command(subcommand)]
        capture: AddCapture,
    },

    #[command(about = "Record a capture and run its transform, as the monitor would")]
    Process {
        #[command(subcommand)]
        capture: AddCapture,
    },

    #[command(about = "Show clipboard history")]
    List {
        #[arg(short, long)]
        kind: Option<EntryKind>,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    #[command(about = "Search text and file paths in the history")]
    Search { query: String },

    #[command(about = "Show one entry as JSON")]
    Show { id: String },

    #[command(about = "Remove every entry and stored image")]
    Clear,

    #[command(about = "Apply search:replace pairs to a text")]
    Replace {
        text: String,

        /// Pairs such as "foo:bar,baz:qux"; defaults to the configured pairs
        pairs: Option<String>,
    },

    #[command(about = "Show build and store information")]
    Info,

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum AddCapture {
    #[command(about = "Record text")]
    Text { text: String },

    #[command(about = "Record references to files")]
    Files {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    #[command(about = "Record references to audio files")]
    Audio {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    #[command(about = "Record an image read from a file")]
    Image { file: PathBuf },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Generate example configuration")]
    Init {
        #[arg(long)]
        force: bool,
    },

    #[command(about = "Validate configuration")]
    Validate,
}

pub struct CliHandler {
    config: Arc<Config>,
    config_path: Option<PathBuf>,
    history: Option<Arc<HistoryStore>>,
}

impl CliHandler {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = Config::load_config(config_path.as_deref())?;

        Ok(Self {
            config: Arc::new(config),
            config_path,
            history: None,
        })
    }

    /// Create a handler suited to `command`
    ///
    /// `config init` may target a file that does not exist yet, so a
    /// missing explicit path falls back to defaults for that command only.
    pub fn for_command(config_path: Option<PathBuf>, command: &Commands) -> Result<Self> {
        let init = matches!(
            command,
            Commands::Config {
                action: ConfigAction::Init { .. }
            }
        );
        if !init {
            return Self::new(config_path);
        }

        let config = match config_path.as_deref() {
            Some(path) => Config::load_or_default(path)?,
            None => Config::load()?,
        };
        Ok(Self {
            config: Arc::new(config),
            config_path,
            history: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lazily create the history store when needed
    fn ensure_history(&mut self) -> Arc<HistoryStore> {
        let config = &self.config;
        Arc::clone(self.history.get_or_insert_with(|| {
            info!("Opening history at {:?}", config.history.dir);
            Arc::new(HistoryStore::from_config(&config.history))
        }))
    }

    pub async fn handle_command(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Add { capture } => self.add(capture).await,
            Commands::Process { capture } => self.process(capture).await,
            Commands::List { kind, limit } => self.list(kind, limit).await,
            Commands::Search { query } => self.search(&query).await,
            Commands::Show { id } => self.show(&id).await,
            Commands::Clear => self.clear().await,
            Commands::Replace { text, pairs } => self.replace(&text, pairs),
            Commands::Info => self.info().await,
            Commands::Config { action } => self.handle_config_action(action),
        }
    }

    async fn add(&mut self, capture: AddCapture) -> Result<()> {
        let capture = to_capture(capture).await?;
        let history = self.ensure_history();
        let recorded = history.record(capture).await?;
        println!("Added {}", recorded.entry.id);
        for evicted in &recorded.evicted {
            println!("Evicted {}", evicted.id);
        }
        output::print_cleanup_failures(&recorded.cleanup);
        Ok(())
    }

    async fn process(&mut self, capture: AddCapture) -> Result<()> {
        let capture = to_capture(capture).await?;
        let history = self.ensure_history();

        let mut handler = CaptureHandler::new(history, &self.config.output.dir);
        if !self.config.replace.pairs.trim().is_empty() {
            handler = handler.with_replacements(parse_replacements(&self.config.replace.pairs)?);
        }

        match handler.process(capture).await {
            Some(Capture::Text(text)) => println!("{}", text),
            Some(other) => println!("Produced {} content", other.kind()),
            None => println!("Recorded"),
        }
        Ok(())
    }

    async fn list(&mut self, kind: Option<EntryKind>, limit: usize) -> Result<()> {
        let history = self.ensure_history();
        let entries = match kind {
            Some(kind) => history.get_entries_by_type(kind).await?,
            None => history.get_history().await?,
        };

        if entries.is_empty() {
            println!("No clipboard history found");
            return Ok(());
        }

        let shown = &entries[..entries.len().min(limit)];
        println!(
            "Clipboard History (showing {} of {} entries):",
            shown.len(),
            entries.len()
        );
        output::print_entries(shown);
        Ok(())
    }

    async fn search(&mut self, query: &str) -> Result<()> {
        let history = self.ensure_history();
        let entries = history.search_entries(query).await?;

        if entries.is_empty() {
            println!("No entries match {:?}", query);
            return Ok(());
        }

        println!("{} matching entries:", entries.len());
        output::print_entries(&entries);
        Ok(())
    }

    async fn show(&mut self, id: &str) -> Result<()> {
        let history = self.ensure_history();
        match history.get_entry(id).await? {
            Some(entry) => print_entry_json(&entry, &history)?,
            None => println!("No entry with id {}", id),
        }
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        let history = self.ensure_history();
        let cleanup = history.clear_history().await?;
        println!(
            "Clipboard history cleared ({} images removed)",
            cleanup.removed.len()
        );
        output::print_cleanup_failures(&cleanup);
        Ok(())
    }

    fn replace(&self, text: &str, pairs: Option<String>) -> Result<()> {
        let pairs = pairs.unwrap_or_else(|| self.config.replace.pairs.clone());
        let rules = parse_replacements(&pairs)?;
        println!("{}", replace_text(text, &rules));
        Ok(())
    }

    async fn info(&mut self) -> Result<()> {
        println!("ClipStash Info:");
        println!("  Version: {}", env!("CARGO_PKG_VERSION"));
        println!("  Target: {}", env!("TARGET"));
        println!("  Built: {}", env!("BUILD_DATE"));
        println!("  History: {}", self.config.history.dir.display());
        println!("  Capacity: {}", self.config.history.max_entries);

        let history = self.ensure_history();
        let entries = history.get_history().await?;
        println!("  Entries: {}", entries.len());
        for kind in [
            EntryKind::Text,
            EntryKind::Image,
            EntryKind::AudioFile,
            EntryKind::Files,
            EntryKind::Unknown,
        ] {
            let count = entries.iter().filter(|e| e.kind() == kind).count();
            if count > 0 {
                println!("    {}: {}", kind, count);
            }
        }
        Ok(())
    }

    fn handle_config_action(&self, action: ConfigAction) -> Result<()> {
        match action {
            ConfigAction::Show => {
                println!("Current Configuration:");
                print!("{}", self.config.to_toml()?);
            }
            ConfigAction::Init { force } => {
                let path = match &self.config_path {
                    Some(path) => path.clone(),
                    None => Config::default_path().context("Could not find config directory")?,
                };
                Config::write_example(&path, force)?;
                println!("Example configuration written to {}", path.display());
            }
            ConfigAction::Validate => {
                // Loading in CliHandler::new already validated it
                println!("Configuration is valid");
            }
        }
        Ok(())
    }
}

fn print_entry_json(entry: &Entry, history: &HistoryStore) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(entry)?);
    if let Some(blob) = history.blob_path(entry) {
        println!("Blob: {}", blob.display());
    }
    Ok(())
}

async fn to_capture(capture: AddCapture) -> Result<Capture> {
    let capture = match capture {
        AddCapture::Text { text } => Capture::text(text),
        AddCapture::Files { paths } => Capture::files(absolute(paths)?),
        AddCapture::Audio { paths } => Capture::audio_file(absolute(paths)?),
        AddCapture::Image { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read image {:?}", file))?;
            Capture::image(bytes)
        }
    };
    Ok(capture)
}

/// Resolve relative paths against the working directory
fn absolute(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    Ok(paths
        .into_iter()
        .map(|p| if p.is_absolute() { p } else { cwd.join(p) })
        .collect())
}
