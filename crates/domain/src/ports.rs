//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{FeedItem, PostRecord};

/// Error type for feed source operations
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),
    #[error("Failed to parse feed: {0}")]
    Parse(String),
}

/// Port for fetching the watched feed
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch all items currently in the feed, in feed order
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, FeedError>;
}

/// Error type for state store operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting published post records
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Look up the record for a link
    async fn get(&self, link: &str) -> Result<Option<PostRecord>, StateError>;

    /// Insert or replace the record keyed by its link
    async fn upsert(&self, record: &PostRecord) -> Result<(), StateError>;
}

/// Error type for publisher operations
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Result of a successful publish operation
#[derive(Debug, Clone, Default)]
pub struct PublishResult {
    /// Platform-specific post ID, if the platform returned one
    pub id: Option<String>,
    /// URL to the published content, if available
    pub url: Option<String>,
}

/// Port for a social destination
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish the text as a new post
    async fn publish(&self, text: &str) -> Result<PublishResult, PublishError>;

    /// Check if this publisher is enabled
    fn is_enabled(&self) -> bool;

    /// Get the platform name (e.g., "mastodon", "bluesky")
    fn platform(&self) -> &'static str;
}

/// Error type for alert delivery
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Alert sink not configured")]
    NotConfigured,
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Port for out-of-band failure notifications
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Send a notification
    async fn notify(&self, title: &str, message: &str) -> Result<(), AlertError>;

    /// Check if this sink is enabled
    fn is_enabled(&self) -> bool;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
