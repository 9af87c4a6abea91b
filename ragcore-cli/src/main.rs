//! ABOUTME: Entry point for the `ragcore` binary: parses args, loads config, dispatches

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, OutputFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `--trace` only applies when RUST_LOG isn't already set; init_logging
    // (shared by every binary) reads RUST_LOG and writes to stderr.
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", cli.trace.as_filter());
    }
    ragcore_core::logging::init_logging(matches!(cli.output, OutputFormat::Json))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let config_path = cli.config.as_ref().map(|p| p.display().to_string());
    let mut config = ragcore_config::RagConfig::load(config_path.as_deref())?;
    if let Some(profile) = cli.profile {
        config = config.with_profile(profile.into());
    }

    if let Err(error) = commands::execute(cli.command, config, cli.output).await {
        tracing::error!(%error, "command failed");
        eprintln!("error: {error}");
        std::process::exit(1);
    }
    Ok(())
}
