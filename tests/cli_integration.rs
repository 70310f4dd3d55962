use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tempfile::TempDir;

use clipstash::{
    cli::{AddCapture, Cli, CliHandler, Commands, ConfigAction},
    history::{EntryKind, HistoryStore},
};

fn write_config(temp_dir: &TempDir, max_entries: usize) -> Result<(PathBuf, PathBuf)> {
    let config_path = temp_dir.path().join("config.toml");
    let history_dir = temp_dir.path().join("history");
    std::fs::write(
        &config_path,
        format!(
            "[history]\ndir = \"{}\"\nmax_entries = {}\n\n[replace]\npairs = \"cat:dog\"\n",
            history_dir.display(),
            max_entries
        ),
    )?;
    Ok((config_path, history_dir))
}

fn open_history(dir: &Path) -> HistoryStore {
    HistoryStore::new(dir)
}

#[tokio::test]
async fn test_cli_parsing() -> Result<()> {
    let cli = Cli::try_parse_from(["clipstash", "list", "--kind", "audio_file", "--limit", "5"])?;
    assert!(matches!(
        cli.command,
        Commands::List {
            kind: Some(EntryKind::AudioFile),
            limit: 5
        }
    ));

    let cli = Cli::try_parse_from(["clipstash", "add", "files", "/a", "/b"])?;
    match cli.command {
        Commands::Add {
            capture: AddCapture::Files { paths },
        } => assert_eq!(paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]),
        _ => panic!("expected add files"),
    }

    assert!(Cli::try_parse_from(["clipstash", "add", "files"]).is_err());

    let cli = Cli::try_parse_from(["clipstash", "--config", "/etc/clipstash.toml", "info"])?;
    assert_eq!(cli.config, Some(PathBuf::from("/etc/clipstash.toml")));
    assert!(!cli.verbose);

    Ok(())
}

#[tokio::test]
async fn test_add_list_search_clear() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (config_path, history_dir) = write_config(&temp_dir, 100)?;
    let image_path = temp_dir.path().join("shot.png");
    std::fs::write(&image_path, b"\x89PNG fake")?;

    let mut handler = CliHandler::new(Some(config_path))?;
    handler
        .handle_command(Commands::Add {
            capture: AddCapture::Text {
                text: "meeting notes".to_string(),
            },
        })
        .await?;
    handler
        .handle_command(Commands::Add {
            capture: AddCapture::Image { file: image_path },
        })
        .await?;
    handler
        .handle_command(Commands::Add {
            capture: AddCapture::Files {
                paths: vec![PathBuf::from("relative/notes.md")],
            },
        })
        .await?;

    handler
        .handle_command(Commands::List {
            kind: None,
            limit: 10,
        })
        .await?;
    handler
        .handle_command(Commands::Search {
            query: "notes".to_string(),
        })
        .await?;

    let history = open_history(&history_dir);
    let entries = history.get_history().await?;
    assert_eq!(entries.len(), 3);
    let files = &entries[0];
    assert!(files.data.paths().unwrap()[0].is_absolute());
    assert_eq!(history.search_entries("notes").await?.len(), 2);

    handler
        .handle_command(Commands::Show {
            id: entries[1].id.clone(),
        })
        .await?;
    handler.handle_command(Commands::Info).await?;
    handler.handle_command(Commands::Clear).await?;

    let history = open_history(&history_dir);
    assert!(history.is_empty().await?);
    Ok(())
}

#[tokio::test]
async fn test_configured_capacity_is_used() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (config_path, history_dir) = write_config(&temp_dir, 2)?;

    let mut handler = CliHandler::new(Some(config_path))?;
    for text in ["one", "two", "three"] {
        handler
            .handle_command(Commands::Add {
                capture: AddCapture::Text {
                    text: text.to_string(),
                },
            })
            .await?;
    }

    let entries = open_history(&history_dir).get_history().await?;
    let texts: Vec<_> = entries.iter().filter_map(|e| e.data.as_text()).collect();
    assert_eq!(texts, vec!["three", "two"]);
    Ok(())
}

#[tokio::test]
async fn test_replace_command() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (config_path, _) = write_config(&temp_dir, 10)?;
    let mut handler = CliHandler::new(Some(config_path))?;

    handler
        .handle_command(Commands::Replace {
            text: "the cat".to_string(),
            pairs: None,
        })
        .await?;

    let bad = handler
        .handle_command(Commands::Replace {
            text: "x".to_string(),
            pairs: Some("no pairs here".to_string()),
        })
        .await;
    assert!(bad.is_err());
    Ok(())
}

#[tokio::test]
async fn test_process_records_and_transforms() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (config_path, history_dir) = write_config(&temp_dir, 10)?;
    let mut handler = CliHandler::new(Some(config_path))?;

    handler
        .handle_command(Commands::Process {
            capture: AddCapture::Text {
                text: "my cat".to_string(),
            },
        })
        .await?;

    // The unmodified text is what gets recorded
    let entries = open_history(&history_dir).get_history().await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data.as_text(), Some("my cat"));
    Ok(())
}

#[tokio::test]
async fn test_config_commands() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (config_path, _) = write_config(&temp_dir, 10)?;
    let mut handler = CliHandler::new(Some(config_path.clone()))?;

    handler
        .handle_command(Commands::Config {
            action: ConfigAction::Show,
        })
        .await?;
    handler
        .handle_command(Commands::Config {
            action: ConfigAction::Validate,
        })
        .await?;

    // Refuses to overwrite without --force
    let init = handler
        .handle_command(Commands::Config {
            action: ConfigAction::Init { force: false },
        })
        .await;
    assert!(init.is_err());

    handler
        .handle_command(Commands::Config {
            action: ConfigAction::Init { force: true },
        })
        .await?;
    let written = std::fs::read_to_string(&config_path)?;
    assert!(written.contains("ClipStash Configuration"));
    Ok(())
}

#[tokio::test]
async fn test_config_init_creates_new_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("fresh").join("config.toml");
    let command = Commands::Config {
        action: ConfigAction::Init { force: false },
    };

    let mut handler = CliHandler::for_command(Some(config_path.clone()), &command)?;
    handler.handle_command(command).await?;

    assert!(config_path.exists());
    let written = std::fs::read_to_string(&config_path)?;
    assert!(written.contains("ClipStash Configuration"));
    assert!(CliHandler::new(Some(config_path)).is_ok());
    Ok(())
}

#[test]
fn test_missing_config_is_rejected_outside_init() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.toml");

    assert!(CliHandler::for_command(Some(missing), &Commands::Info).is_err());
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[history]\nmax_entries = 0\n").unwrap();

    assert!(CliHandler::new(Some(config_path)).is_err());
}
