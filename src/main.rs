//! ClipStash - persistent clipboard history
//!
//! This is the main entry point for the `clipstash` command.

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipstash::cli::{Cli, CliHandler};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut handler = CliHandler::for_command(cli.config, &cli.command)?;

    // Initialize logging
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        handler.config().log_level.clone()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("clipstash={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("ClipStash v{}", env!("CARGO_PKG_VERSION"));

    handler.handle_command(cli.command).await?;

    Ok(())
}
