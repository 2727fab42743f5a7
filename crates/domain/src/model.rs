//! Domain models and value objects

use time::OffsetDateTime;

/// A single entry from the watched feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    /// Entry title
    pub title: String,
    /// Entry URL, the identity of the post
    pub link: String,
    /// Entry body (RSS description)
    pub content: String,
}

/// Last successfully published state of a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    /// Post URL (primary key)
    pub link: String,
    /// Hex fingerprint of the content last published to the primary destination
    pub content_hash: String,
    /// When the record was last written
    pub timestamp: OffsetDateTime,
}

/// Whether an item has been seen before and whether its content changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub exists: bool,
    pub changed: bool,
}

impl Classification {
    pub const NEW: Self = Self {
        exists: false,
        changed: false,
    };
    pub const UPDATED: Self = Self {
        exists: true,
        changed: true,
    };
    pub const UNCHANGED: Self = Self {
        exists: true,
        changed: false,
    };

    pub fn is_new(&self) -> bool {
        !self.exists
    }

    pub fn is_update(&self) -> bool {
        self.exists && self.changed
    }

    pub fn is_unchanged(&self) -> bool {
        self.exists && !self.changed
    }
}

/// Processing result for a single feed item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// Published to the primary destination and recorded
    Published {
        is_update: bool,
        text: String,
        /// Platforms of secondary destinations that failed
        secondary_failures: Vec<String>,
    },
    /// Already published with identical content
    Unchanged,
    /// Would have been published (dry run)
    DryRun { text: String },
    /// Primary publish failed; the item is retried next cycle
    Deferred { error: String },
    /// State store failed; the item is skipped this cycle
    Failed { error: String },
}

/// Summary of one poll cycle
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Items returned by the feed
    pub fetched: usize,
    /// Items dropped by the category filter
    pub filtered: usize,
    /// Per-link results for the remaining items, in feed order
    pub results: Vec<(String, ProcessResult)>,
}

impl CycleReport {
    pub fn published(&self) -> usize {
        self.count(|r| matches!(r, ProcessResult::Published { .. }))
    }

    pub fn deferred(&self) -> usize {
        self.count(|r| matches!(r, ProcessResult::Deferred { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, ProcessResult::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ProcessResult) -> bool) -> usize {
        self.results.iter().filter(|(_, r)| predicate(r)).count()
    }
}
