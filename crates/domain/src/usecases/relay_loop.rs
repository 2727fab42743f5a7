//! Relay loop use case - orchestrates fetching, change detection and publishing

use std::sync::Arc;
use std::time::Duration;

use crate::{
    model::{CycleReport, FeedItem, ProcessResult},
    ports::{AlertSink, Clock, FeedSource, PostStore, Publisher},
    usecases::{change_store::ChangeStore, format::Formatter},
};

/// Poll interval used when the configured one is not positive
pub const DEFAULT_POLL_INTERVAL_MINS: i64 = 60;

/// Convert the configured interval in minutes to a tick period.
///
/// Non-positive values fall back to [`DEFAULT_POLL_INTERVAL_MINS`] so the
/// loop never spins without a delay. Huge values saturate instead of
/// overflowing.
pub fn poll_interval(minutes: i64) -> Duration {
    let minutes = if minutes <= 0 {
        tracing::warn!(
            configured = minutes,
            fallback = DEFAULT_POLL_INTERVAL_MINS,
            "Poll interval must be positive, using default"
        );
        DEFAULT_POLL_INTERVAL_MINS
    } else {
        minutes
    };
    Duration::from_secs((minutes as u64).saturating_mul(60))
}

/// Configuration for the relay loop
#[derive(Debug, Clone, Default)]
pub struct RelayLoopConfig {
    /// Feed to watch
    pub feed_url: String,
    /// Only relay items whose last link segment contains this string
    pub category: Option<String>,
    /// Title prefixes announced as "{content} - {link}"
    pub skip_prefix_categories: Vec<String>,
    /// Log what would be published without publishing or recording
    pub dry_run: bool,
}

/// Relay loop orchestrator
pub struct RelayLoop<F, P, A, St, Cl>
where
    F: FeedSource + ?Sized,
    P: Publisher + ?Sized,
    A: AlertSink + ?Sized,
    St: PostStore + ?Sized,
    Cl: Clock + ?Sized,
{
    feed_source: Arc<F>,
    primary: Arc<P>,
    secondaries: Vec<Arc<dyn Publisher>>,
    alert_sink: Arc<A>,
    changes: ChangeStore<St, Cl>,
    formatter: Formatter,
    config: RelayLoopConfig,
}

impl<F, P, A, St, Cl> RelayLoop<F, P, A, St, Cl>
where
    F: FeedSource + ?Sized,
    P: Publisher + ?Sized,
    A: AlertSink + ?Sized,
    St: PostStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        feed_source: Arc<F>,
        primary: Arc<P>,
        secondaries: Vec<Arc<dyn Publisher>>,
        alert_sink: Arc<A>,
        changes: ChangeStore<St, Cl>,
        config: RelayLoopConfig,
    ) -> Self {
        let formatter = Formatter::new(config.skip_prefix_categories.clone());
        Self {
            feed_source,
            primary,
            secondaries,
            alert_sink,
            changes,
            formatter,
            config,
        }
    }

    /// Run a single poll cycle over the feed
    pub async fn poll_once(&self) -> Result<CycleReport, RelayLoopError> {
        tracing::debug!(feed_url = %self.config.feed_url, "Fetching feed");

        let items = self
            .feed_source
            .fetch(&self.config.feed_url)
            .await
            .map_err(|e| RelayLoopError::Feed(e.to_string()))?;

        let mut report = CycleReport {
            fetched: items.len(),
            ..Default::default()
        };

        for item in items {
            if !self.matches_category(&item) {
                report.filtered += 1;
                continue;
            }

            let result = self.process_item(&item).await;
            report.results.push((item.link, result));
        }

        tracing::info!(
            fetched = report.fetched,
            filtered = report.filtered,
            published = report.published(),
            deferred = report.deferred(),
            failed = report.failed(),
            "Poll cycle complete"
        );

        Ok(report)
    }

    fn matches_category(&self, item: &FeedItem) -> bool {
        let Some(category) = self.config.category.as_deref().filter(|c| !c.is_empty()) else {
            return true;
        };

        let segment = last_path_segment(&item.link);
        if segment.contains(category) {
            return true;
        }

        tracing::debug!(
            title = %item.title,
            category = %category,
            segment = %segment,
            "Skipping post: category not in last URL segment"
        );
        false
    }

    /// Process a single feed item
    async fn process_item(&self, item: &FeedItem) -> ProcessResult {
        let classification = match self.changes.classify(&item.link, &item.content).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(link = %item.link, error = %e, "Failed to look up post state");
                return ProcessResult::Failed {
                    error: format!("Lookup failed: {}", e),
                };
            }
        };

        if classification.is_unchanged() {
            return ProcessResult::Unchanged;
        }

        let is_update = classification.is_update();
        if is_update {
            tracing::info!(link = %item.link, title = %item.title, "Post has been updated");
        } else {
            tracing::info!(link = %item.link, title = %item.title, "New post");
        }

        let text = self.formatter.format(item, is_update);

        if self.config.dry_run {
            tracing::info!(link = %item.link, text = %text, "[DRY RUN] Would publish");
            return ProcessResult::DryRun { text };
        }

        if let Err(e) = self.primary.publish(&text).await {
            tracing::error!(
                link = %item.link,
                platform = self.primary.platform(),
                is_update = is_update,
                error = %e,
                "Failed to publish to primary destination"
            );
            self.alert(item, &e.to_string()).await;
            return ProcessResult::Deferred {
                error: e.to_string(),
            };
        }

        if let Err(e) = self.changes.record(&item.link, &item.content).await {
            tracing::error!(link = %item.link, error = %e, "Failed to record published post");
            return ProcessResult::Failed {
                error: format!("Record failed: {}", e),
            };
        }

        let mut secondary_failures = Vec::new();
        for publisher in self.secondaries.iter().filter(|p| p.is_enabled()) {
            let platform = publisher.platform();
            tracing::info!(link = %item.link, platform = platform, "Posting to secondary destination");
            match publisher.publish(&text).await {
                Ok(_) => {
                    tracing::info!(link = %item.link, platform = platform, "Published");
                }
                Err(e) => {
                    tracing::warn!(
                        link = %item.link,
                        platform = platform,
                        error = %e,
                        "Failed to publish to secondary destination"
                    );
                    secondary_failures.push(platform.to_string());
                }
            }
        }

        ProcessResult::Published {
            is_update,
            text,
            secondary_failures,
        }
    }

    async fn alert(&self, item: &FeedItem, error: &str) {
        if !self.alert_sink.is_enabled() {
            return;
        }

        let title = format!("Failed to post to {}", self.primary.platform());
        let message = format!("{}: {}", item.link, error);
        if let Err(e) = self.alert_sink.notify(&title, &message).await {
            tracing::warn!(error = %e, "Failed to send alert");
        }
    }
}

/// Text after the final `/`, ignoring trailing slashes
fn last_path_segment(link: &str) -> &str {
    let trimmed = link.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Errors from the relay loop
#[derive(Debug, thiserror::Error)]
pub enum RelayLoopError {
    #[error("Feed error: {0}")]
    Feed(String),
}
