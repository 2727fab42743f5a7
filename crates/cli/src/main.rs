//! rss-relay CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Variables already set win over `.env`
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = log_level(&cli);
    init_logging(&log_level)?;

    // Execute command
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args, cli.config).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
    }
}

/// `--debug` or `DEBUG`, then `--log-level`, then `general.log_level`, then `info`
fn log_level(cli: &Cli) -> String {
    if cli.debug || debug_env(std::env::var("DEBUG").ok().as_deref()) {
        return "debug".to_string();
    }

    if let Some(ref level) = cli.log_level {
        return level.clone();
    }

    config::AppConfig::load(cli.config.as_deref())
        .map(|c| c.general.log_level)
        .unwrap_or_else(|_| "info".to_string())
}

fn debug_env(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
