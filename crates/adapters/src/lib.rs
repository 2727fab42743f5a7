//! rss-relay adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `feed`: RSS feed source over HTTP
//! - `state`: SQLite and in-memory post stores
//! - `mastodon`, `bluesky`, `threads`: social publishers
//! - `gotify`: alert sink
//! - `stub`: in-process fakes for tests and offline runs

mod feed_rss;
mod state_memory;
mod state_sqlite;

pub mod bluesky;
pub mod gotify;
pub mod mastodon;
pub mod stub;
pub mod threads;

use std::time::Duration;

/// Re-exports for feed adapters
pub mod feed {
    pub use crate::feed_rss::{RssFeedSource, parse_feed};
}

/// Re-exports for state adapters
pub mod state {
    pub use crate::state_memory::InMemoryPostStore;
    pub use crate::state_sqlite::SqlitePostStore;
}

/// User agent sent with every outbound request
pub const USER_AGENT: &str = concat!("rss-relay/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by all adapters.
///
/// `timeout` bounds every request; a hanging destination delays the cycle by
/// at most this much per call.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}
