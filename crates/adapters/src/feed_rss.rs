//! RSS feed source

use async_trait::async_trait;
use reqwest::Client;
use rss::Channel;
use rss_relay_domain::{FeedError, FeedItem, FeedSource};

/// Fetches and parses an RSS 2.0 feed over HTTP
pub struct RssFeedSource {
    client: Client,
}

impl RssFeedSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, FeedError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        parse_feed(&body)
    }
}

/// Parse an RSS document into feed items.
///
/// Items without a `<link>` have no identity and are dropped.
pub fn parse_feed(data: &[u8]) -> Result<Vec<FeedItem>, FeedError> {
    let channel = Channel::read_from(data).map_err(|e| FeedError::Parse(e.to_string()))?;

    let items = channel
        .items()
        .iter()
        .filter_map(|item| {
            let Some(link) = item.link().map(str::trim).filter(|l| !l.is_empty()) else {
                tracing::debug!(title = ?item.title(), "Dropping feed item without link");
                return None;
            };
            Some(FeedItem {
                title: item.title().unwrap_or_default().to_string(),
                link: link.to_string(),
                content: item.description().unwrap_or_default().to_string(),
            })
        })
        .collect();

    Ok(items)
}
