//! Run command - poll the feed and publish new or updated posts

use anyhow::{Context, Result};
use reqwest::Client;
use rss_relay_adapters::{
    bluesky::BlueskyPublisher, feed::RssFeedSource, gotify::GotifyAlertSink,
    mastodon::MastodonPublisher, state::SqlitePostStore, threads::ThreadsPublisher,
};
use rss_relay_domain::{
    CycleReport, ProcessResult, Publisher, SystemClock,
    usecases::{ChangeStore, RelayLoop, RelayLoopConfig, poll_interval},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

use crate::args::RunArgs;
use crate::config::{AppConfig, load_secret, optional_secret};

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config = AppConfig::load(config_path.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let dry_run = args.dry_run || config.general.dry_run;

    tracing::info!(
        feed_url = %config.feed.url,
        category = ?config.category(),
        dry_run = dry_run,
        once = args.once,
        "Starting rss-relay run"
    );

    let client = rss_relay_adapters::http_client(Duration::from_secs(
        config.general.http_timeout_secs,
    ))
    .context("Failed to build HTTP client")?;

    let primary = Arc::new(build_mastodon_publisher(&config, &client)?);
    let secondaries: Vec<Arc<dyn Publisher>> = vec![
        Arc::new(build_bluesky_publisher(&config, &client)),
        Arc::new(build_threads_publisher(&config, &client)),
    ];
    let alert_sink = Arc::new(build_alert_sink(&config, &client));

    let store = Arc::new(
        SqlitePostStore::open(&config.general.state_db_path)
            .await
            .context("Failed to open SQLite post store")?,
    );

    let loop_config = RelayLoopConfig {
        feed_url: config.feed.url.clone(),
        category: config.category(),
        skip_prefix_categories: config.feed.skip_prefix_categories.clone(),
        dry_run,
    };

    let relay = RelayLoop::new(
        Arc::new(RssFeedSource::new(client.clone())),
        primary,
        secondaries,
        alert_sink,
        ChangeStore::new(Arc::clone(&store), Arc::new(SystemClock)),
        loop_config,
    );

    let outcome = if args.once {
        tracing::info!("Running single poll cycle");
        relay
            .poll_once()
            .await
            .map(|report| log_report(&report))
            .context("Poll cycle failed")
    } else {
        let mut ticker = interval(poll_interval(config.feed.poll_interval_mins));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Set up graceful shutdown
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        };

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match relay.poll_once().await {
                        Ok(report) => log_report(&report),
                        Err(e) => {
                            tracing::error!(error = %e, "Poll cycle failed, retrying next tick");
                        }
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutting down gracefully");
                    break;
                }
            }
        }

        Ok(())
    };

    store.close().await;
    outcome?;

    tracing::info!("rss-relay run completed");
    Ok(())
}

/// Fold `run` flags over the loaded configuration
fn apply_overrides(config: &mut AppConfig, args: &RunArgs) {
    if let Some(ref url) = args.feed_url {
        config.feed.url = url.clone();
    }
    if let Some(minutes) = args.interval {
        config.feed.poll_interval_mins = minutes;
    }
    if let Some(ref category) = args.category {
        config.feed.category = category.clone();
    }
    if let Some(ref prefixes) = args.skip_prefix_categories {
        config.feed.skip_prefix_categories = prefixes
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
    }
    if let Some(ref handle) = args.bluesky_handle {
        config.bluesky.handle = handle.clone();
    }
    if let Some(ref pds) = args.bluesky_pds {
        config.bluesky.pds = pds.clone();
    }
    if let Some(ref user_id) = args.threads_user_id {
        config.threads.user_id = user_id.clone();
    }
    if args.dry_run {
        config.general.dry_run = true;
    }
}

fn build_mastodon_publisher(config: &AppConfig, client: &Client) -> Result<MastodonPublisher> {
    let token = load_secret(&config.mastodon.access_token_env, "mastodon")?;
    Ok(MastodonPublisher::new(
        client.clone(),
        config.mastodon.url.clone(),
        token,
    ))
}

fn build_bluesky_publisher(config: &AppConfig, client: &Client) -> BlueskyPublisher {
    if config.bluesky.handle.trim().is_empty() {
        return BlueskyPublisher::disabled();
    }

    match optional_secret(&config.bluesky.password_env) {
        Some(password) => BlueskyPublisher::new(
            client.clone(),
            config.bluesky.handle.clone(),
            password,
            config.bluesky.pds.clone(),
        ),
        None => {
            tracing::warn!(
                env_var = %config.bluesky.password_env,
                "Bluesky handle set but password env var is missing, Bluesky disabled"
            );
            BlueskyPublisher::disabled()
        }
    }
}

fn build_threads_publisher(config: &AppConfig, client: &Client) -> ThreadsPublisher {
    if config.threads.user_id.trim().is_empty() {
        return ThreadsPublisher::disabled();
    }

    match optional_secret(&config.threads.token_env) {
        Some(token) => ThreadsPublisher::new(
            client.clone(),
            config.threads.user_id.clone(),
            token,
            config.threads.api_url.clone(),
        ),
        None => {
            tracing::warn!(
                env_var = %config.threads.token_env,
                "Threads user ID set but token env var is missing, Threads disabled"
            );
            ThreadsPublisher::disabled()
        }
    }
}

fn build_alert_sink(config: &AppConfig, client: &Client) -> GotifyAlertSink {
    if config.gotify.url.trim().is_empty() {
        return GotifyAlertSink::disabled();
    }

    match optional_secret(&config.gotify.token_env) {
        Some(token) => GotifyAlertSink::new(client.clone(), config.gotify.url.clone(), token),
        None => {
            tracing::warn!(
                env_var = %config.gotify.token_env,
                "Gotify URL set but token env var is missing, alerts disabled"
            );
            GotifyAlertSink::disabled()
        }
    }
}

fn log_report(report: &CycleReport) {
    for (link, result) in &report.results {
        match result {
            ProcessResult::Published {
                is_update,
                secondary_failures,
                ..
            } => {
                tracing::info!(
                    link = %link,
                    is_update = is_update,
                    secondary_failures = ?secondary_failures,
                    "Published"
                );
            }
            ProcessResult::Unchanged => {
                tracing::debug!(link = %link, "Unchanged");
            }
            ProcessResult::DryRun { text } => {
                tracing::info!(link = %link, text = %text, "Dry run");
            }
            ProcessResult::Deferred { error } => {
                tracing::warn!(link = %link, error = %error, "Deferred to next cycle");
            }
            ProcessResult::Failed { error } => {
                tracing::error!(link = %link, error = %error, "Failed");
            }
        }
    }
}
