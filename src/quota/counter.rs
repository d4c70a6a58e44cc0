//! Windowed counter operations.
//!
//! One counter exists per (rule identifier, time segment) pair. There is no
//! stored window index: a counter's expiry is what makes it belong to the
//! current window. The store auto-creates a counter at 1 on the first
//! increment of a window and drops it when the window's expiry passes.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::segment::{now_epoch, TimeSegment};
use crate::store::CounterStore;

use super::keys::KeySpace;

/// Store-backed windowed counters for rule identifiers.
pub struct CounterEngine {
    store: Arc<dyn CounterStore>,
    keys: KeySpace,
    segments: Vec<TimeSegment>,
}

impl CounterEngine {
    pub(crate) fn new(
        store: Arc<dyn CounterStore>,
        keys: KeySpace,
        segments: Vec<TimeSegment>,
    ) -> Self {
        Self {
            store,
            keys,
            segments,
        }
    }

    /// The segments tracked for every rule.
    pub fn segments(&self) -> &[TimeSegment] {
        &self.segments
    }

    /// Record one event against every tracked segment of `id`.
    ///
    /// The atomic increment's return value is the window-creation signal: a
    /// post-increment value of exactly 1 means this caller created the key,
    /// and only that caller sets the expiry, pinned to the segment's current
    /// window end. Later increments never touch the expiry; re-setting it on
    /// every event would turn the fixed window into a sliding one that a
    /// steady trickle of traffic could keep from ever resetting.
    pub async fn incr(&self, id: &str) -> Result<()> {
        let now = now_epoch();
        for segment in &self.segments {
            let key = self.keys.counter(id, *segment);
            let value = self.store.incr(&key).await?;
            if value == 1 {
                self.store
                    .expire_at(&key, segment.window_expiry(now))
                    .await?;
            }
            trace!(id = %id, segment = %segment, value = value, "Incremented counter");
        }
        Ok(())
    }

    /// Reset every tracked segment's counter for `id` to a fresh window.
    ///
    /// Deleting the key re-arms the window: the next increment recreates it
    /// and sets a new expiry.
    pub async fn clear(&self, id: &str) -> Result<()> {
        for segment in &self.segments {
            self.store.delete(&self.keys.counter(id, *segment)).await?;
        }
        trace!(id = %id, "Cleared counters");
        Ok(())
    }

    /// Current counter value for one segment; 0 if the counter has expired or
    /// was never incremented in the current window.
    pub async fn read(&self, id: &str, segment: TimeSegment) -> Result<u64> {
        let value = self
            .store
            .get(&self.keys.counter(id, segment))
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        Ok(value)
    }

    /// Current counter values for every tracked segment.
    pub async fn read_all(&self, id: &str) -> Result<BTreeMap<TimeSegment, u64>> {
        let mut counters = BTreeMap::new();
        for segment in &self.segments {
            counters.insert(*segment, self.read(id, *segment).await?);
        }
        Ok(counters)
    }
}
