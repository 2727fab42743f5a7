//! Stub adapters for testing and offline runs

use async_trait::async_trait;
use rss_relay_domain::{
    AlertError, AlertSink, FeedError, FeedItem, FeedSource, PublishError, PublishResult,
    Publisher,
};
use std::sync::Mutex;

/// Feed source serving a fixed list of items
pub struct StubFeedSource {
    items: Mutex<Vec<FeedItem>>,
    error: Option<String>,
}

impl StubFeedSource {
    pub fn with_items(items: Vec<FeedItem>) -> Self {
        Self {
            items: Mutex::new(items),
            error: None,
        }
    }

    /// Create a source whose every fetch fails
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            error: Some(message.into()),
        }
    }

    /// Replace the served items (simulates the feed changing between polls)
    pub fn set_items(&self, items: Vec<FeedItem>) {
        if let Ok(mut current) = self.items.lock() {
            *current = items;
        }
    }
}

#[async_trait]
impl FeedSource for StubFeedSource {
    async fn fetch(&self, _url: &str) -> Result<Vec<FeedItem>, FeedError> {
        if let Some(ref message) = self.error {
            return Err(FeedError::Network(message.clone()));
        }

        self.items
            .lock()
            .map(|items| items.clone())
            .map_err(|e| FeedError::Network(e.to_string()))
    }
}

/// Publisher that records every text it is asked to post
pub struct StubPublisher {
    platform: &'static str,
    posts: Mutex<Vec<String>>,
    fail_with: Option<String>,
    enabled: bool,
}

impl StubPublisher {
    pub fn new(platform: &'static str) -> Self {
        Self {
            platform,
            posts: Mutex::new(Vec::new()),
            fail_with: None,
            enabled: true,
        }
    }

    /// Create a publisher that rejects every post
    pub fn failing(platform: &'static str, message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::new(platform)
        }
    }

    pub fn disabled(platform: &'static str) -> Self {
        Self {
            enabled: false,
            ..Self::new(platform)
        }
    }

    /// Texts accepted so far, in order
    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(&self, text: &str) -> Result<PublishResult, PublishError> {
        if let Some(ref message) = self.fail_with {
            return Err(PublishError::Api(message.clone()));
        }

        let mut posts = self
            .posts
            .lock()
            .map_err(|e| PublishError::Api(e.to_string()))?;
        posts.push(text.to_string());

        Ok(PublishResult {
            id: Some(format!("stub-{}", posts.len())),
            url: None,
        })
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn platform(&self) -> &'static str {
        self.platform
    }
}

/// Alert sink that keeps alerts in memory
#[derive(Default)]
pub struct StubAlertSink {
    alerts: Mutex<Vec<(String, String)>>,
}

impl StubAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts received so far as `(title, message)` pairs
    pub fn alerts(&self) -> Vec<(String, String)> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AlertSink for StubAlertSink {
    async fn notify(&self, title: &str, message: &str) -> Result<(), AlertError> {
        self.alerts
            .lock()
            .map_err(|e| AlertError::Api(e.to_string()))?
            .push((title.to_string(), message.to_string()));
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(link: &str) -> FeedItem {
        FeedItem {
            title: "Title".to_string(),
            link: link.to_string(),
            content: "Body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_feed_source_serves_current_items() {
        let source = StubFeedSource::with_items(vec![item("https://blog.example/a")]);
        assert_eq!(source.fetch("ignored").await.unwrap().len(), 1);

        source.set_items(vec![]);
        assert!(source.fetch("ignored").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feed_source_error() {
        let source = StubFeedSource::with_error("offline");
        assert!(matches!(
            source.fetch("ignored").await,
            Err(FeedError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_publisher_records_posts() {
        let publisher = StubPublisher::new("mastodon");

        let result = publisher.publish("first").await.unwrap();
        publisher.publish("second").await.unwrap();

        assert_eq!(result.id.as_deref(), Some("stub-1"));
        assert_eq!(publisher.posts(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_failing_publisher() {
        let publisher = StubPublisher::failing("bluesky", "down");

        assert!(publisher.publish("text").await.is_err());
        assert!(publisher.posts().is_empty());
    }

    #[tokio::test]
    async fn test_alert_sink_records_alerts() {
        let sink = StubAlertSink::new();
        sink.notify("title", "message").await.unwrap();

        assert_eq!(
            sink.alerts(),
            vec![("title".to_string(), "message".to_string())]
        );
    }
}
