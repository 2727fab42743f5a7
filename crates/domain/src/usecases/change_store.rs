//! Change detection over the post store

use std::sync::Arc;

use crate::{
    fingerprint::{Fingerprint, fingerprint},
    model::{Classification, PostRecord},
    ports::{Clock, PostStore, StateError},
};

/// Classifies feed items against the last published state and records
/// successful publishes.
pub struct ChangeStore<St, Cl>
where
    St: PostStore + ?Sized,
    Cl: Clock + ?Sized,
{
    store: Arc<St>,
    clock: Arc<Cl>,
}

impl<St, Cl> ChangeStore<St, Cl>
where
    St: PostStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(store: Arc<St>, clock: Arc<Cl>) -> Self {
        Self { store, clock }
    }

    /// Compare `content` against the stored fingerprint for `link`.
    ///
    /// A link with no record is new: `(false, false)`.
    pub async fn classify(&self, link: &str, content: &str) -> Result<Classification, StateError> {
        let Some(record) = self.store.get(link).await? else {
            return Ok(Classification::NEW);
        };

        let stored: Fingerprint = record
            .content_hash
            .parse()
            .map_err(|e| StateError::Serialization(format!("{} (link {})", e, link)))?;

        if stored == fingerprint(content) {
            Ok(Classification::UNCHANGED)
        } else {
            Ok(Classification::UPDATED)
        }
    }

    /// Store the fingerprint of `content` as the published state of `link`
    pub async fn record(&self, link: &str, content: &str) -> Result<(), StateError> {
        let record = PostRecord {
            link: link.to_string(),
            content_hash: fingerprint(content).to_string(),
            timestamp: self.clock.now(),
        };
        self.store.upsert(&record).await
    }
}
