//! Doctor command - validate configuration and show status

use anyhow::Result;
use rss_relay_adapters::{feed::RssFeedSource, state::SqlitePostStore};
use rss_relay_domain::FeedSource;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    feed: CheckResult,
    state: CheckResult,
    mastodon: CheckResult,
    bluesky: CheckResult,
    threads: CheckResult,
    gotify: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        feed: CheckResult::error("Not checked"),
        state: CheckResult::error("Not checked"),
        mastodon: CheckResult::error("Not checked"),
        bluesky: CheckResult::error("Not checked"),
        threads: CheckResult::error("Not checked"),
        gotify: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.feed = check_feed(config).await;
        report.state = check_state(&config.general.state_db_path).await;
        report.mastodon = check_mastodon(config);
        report.bluesky = check_optional_credentials(
            "Bluesky",
            &config.bluesky.handle,
            &config.bluesky.password_env,
        );
        report.threads = check_optional_credentials(
            "Threads",
            &config.threads.user_id,
            &config.threads.token_env,
        );
        report.gotify =
            check_optional_credentials("Gotify", &config.gotify.url, &config.gotify.token_env);
    }

    // Determine overall status
    let checks = [
        &report.config,
        &report.feed,
        &report.state,
        &report.mastodon,
        &report.bluesky,
        &report.threads,
        &report.gotify,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_feed(config: &AppConfig) -> CheckResult {
    let url = config.feed.url.trim();
    if url.is_empty() {
        return CheckResult::error("No feed URL configured");
    }

    let client = match rss_relay_adapters::http_client(Duration::from_secs(
        config.general.http_timeout_secs.max(1),
    )) {
        Ok(c) => c,
        Err(e) => return CheckResult::error(format!("Failed to build HTTP client: {}", e)),
    };

    match RssFeedSource::new(client).fetch(url).await {
        Ok(items) => CheckResult::ok(format!("{} items in {}", items.len(), url)).with_details(
            serde_json::json!({
                "url": url,
                "items": items.len(),
                "category": config.category(),
                "poll_interval_mins": config.feed.poll_interval_mins,
            }),
        ),
        Err(e) => CheckResult::error(format!("Failed to fetch {}: {}", url, e)),
    }
}

async fn check_state(path: &Path) -> CheckResult {
    match SqlitePostStore::open(path).await {
        Ok(store) => {
            store.close().await;
            CheckResult::ok(format!("State database: {}", path.display()))
        }
        Err(e) => CheckResult::error(format!(
            "Failed to open state database {}: {}",
            path.display(),
            e
        )),
    }
}

fn check_mastodon(config: &AppConfig) -> CheckResult {
    let url = config.mastodon.url.trim();
    if url.is_empty() {
        return CheckResult::error("No Mastodon instance URL configured");
    }

    let env_var = &config.mastodon.access_token_env;
    if env_var.is_empty() {
        return CheckResult::error("No access token env var configured");
    }

    match std::env::var(env_var) {
        Ok(val) if !val.trim().is_empty() => {
            CheckResult::ok(format!("Instance: {}, Access token: {} (set)", url, env_var))
        }
        _ => CheckResult::error(format!(
            "Instance: {}, Access token: {} (not set)",
            url, env_var
        )),
    }
}

/// Secondary destinations and the alert sink are optional: unset is fine,
/// half-configured is a warning.
fn check_optional_credentials(name: &str, identity: &str, env_var: &str) -> CheckResult {
    if identity.trim().is_empty() {
        return CheckResult::ok(format!("{} disabled", name));
    }

    match std::env::var(env_var) {
        Ok(val) if !val.trim().is_empty() => {
            CheckResult::ok(format!("{}: {}, secret: {} (set)", name, identity, env_var))
        }
        _ => CheckResult::warn(format!(
            "{}: {}, secret: {} (not set), will be disabled",
            name, identity, env_var
        )),
    }
}

fn print_report(report: &DoctorReport) {
    println!("rss-relay Doctor Report");
    println!("=======================");
    println!();

    print_check("Config", &report.config);
    print_check("Feed", &report.feed);
    print_check("State", &report.state);
    print_check("Mastodon", &report.mastodon);
    print_check("Bluesky", &report.bluesky);
    print_check("Threads", &report.threads);
    print_check("Gotify", &report.gotify);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: rss-relay run --dry-run --once");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
