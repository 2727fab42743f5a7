//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// rss-relay: announce new and updated blog posts on social networks
#[derive(Parser, Debug)]
#[command(name = "rss-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Shortcut for --log-level debug
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the feed and publish new or updated posts
    Run(RunArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Log what would be published without publishing or recording
    #[arg(long)]
    pub dry_run: bool,

    /// Process one poll cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Feed URL (overrides feed.url)
    #[arg(long)]
    pub feed_url: Option<String>,

    /// Poll interval in minutes (overrides feed.poll_interval_mins)
    #[arg(long, allow_negative_numbers = true)]
    pub interval: Option<i64>,

    /// Only relay posts whose last URL segment contains this string
    #[arg(long)]
    pub category: Option<String>,

    /// Comma-separated title prefixes announced with their content
    #[arg(long, value_delimiter = ',')]
    pub skip_prefix_categories: Option<Vec<String>>,

    /// Bluesky handle (overrides bluesky.handle)
    #[arg(long)]
    pub bluesky_handle: Option<String>,

    /// Bluesky PDS URL (overrides bluesky.pds)
    #[arg(long)]
    pub bluesky_pds: Option<String>,

    /// Threads user ID (overrides threads.user_id)
    #[arg(long)]
    pub threads_user_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
