//! The public engine facade.

use std::sync::Arc;

use tracing::debug;

use crate::config::FloodgateConfig;
use crate::error::Result;
use crate::quota::{
    CounterEngine, CreateParams, KeySpace, Rule, RuleStore, StatsSnapshot, UpdatePatch,
};
use crate::segment::TimeSegment;
use crate::store::CounterStore;

/// The windowed-counter quota engine.
///
/// Holds only a handle to the backing store and immutable configuration, so
/// any number of instances across processes can serve the same rules
/// concurrently with no coordination beyond the store's own atomicity. No
/// rule metadata is cached between calls.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use floodgate::{Floodgate, FloodgateConfig, CreateParams, TimeSegment, RedisStore};
///
/// # async fn run() -> floodgate::Result<()> {
/// let store = Arc::new(RedisStore::connect("redis://127.0.0.1/").await?);
/// let gate = Floodgate::new(store, FloodgateConfig::default());
///
/// gate.create(CreateParams {
///     key: "api-calls".to_string(),
///     max: 100,
///     time: TimeSegment::Minute,
/// })
/// .await?;
///
/// gate.incr("api-calls").await?;
/// let stats = gate.stats("api-calls").await?.expect("rule exists");
/// assert!(stats.allowed);
/// # Ok(())
/// # }
/// ```
pub struct Floodgate {
    rules: RuleStore,
    counters: CounterEngine,
    keys: KeySpace,
}

impl Floodgate {
    /// Create an engine over a backing store.
    pub fn new(store: Arc<dyn CounterStore>, config: FloodgateConfig) -> Self {
        let keys = KeySpace::new(config.key_prefix);
        Self {
            rules: RuleStore::new(
                Arc::clone(&store),
                keys.clone(),
                config.time_segments.clone(),
            ),
            counters: CounterEngine::new(store, keys.clone(), config.time_segments),
            keys,
        }
    }

    /// The namespace prefix under which every store key lives.
    pub fn prefix(&self) -> &str {
        self.keys.prefix()
    }

    /// The time segments tracked for every rule.
    pub fn time_segments(&self) -> &[TimeSegment] {
        self.counters.segments()
    }

    /// Create a new rule.
    ///
    /// Fails with [`DuplicateKey`](crate::FloodgateError::DuplicateKey) if a
    /// rule already exists for the key,
    /// [`InvalidMax`](crate::FloodgateError::InvalidMax) if `max` is zero, or
    /// [`InvalidSegment`](crate::FloodgateError::InvalidSegment) if the
    /// enforced segment is not in the tracked segment list.
    pub async fn create(&self, params: CreateParams) -> Result<Rule> {
        self.rules.create(params).await
    }

    /// Find a rule by key; `None` if it does not exist.
    pub async fn find(&self, key: &str) -> Result<Option<Rule>> {
        self.rules.find(key).await
    }

    /// Resolve a rule's generated identifier without loading its metadata.
    pub async fn find_id(&self, key: &str) -> Result<Option<String>> {
        self.rules.find_id(key).await
    }

    /// Adjust a rule's `max`. Returns `false` if no rule exists for `key`.
    pub async fn update(&self, key: &str, patch: UpdatePatch) -> Result<bool> {
        self.rules.update(key, patch).await
    }

    /// Remove a rule, its metadata, and every tracked segment's counter.
    ///
    /// Idempotent: returns `false` (never an error) once the rule is gone.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let Some(id) = self.rules.remove(key).await? else {
            return Ok(false);
        };
        self.counters.clear(&id).await?;
        Ok(true)
    }

    /// Record one event against every tracked segment of the rule for `key`.
    ///
    /// Returns `false` if no rule exists for `key`, so callers can detect
    /// unknown keys without matching on an error.
    pub async fn incr(&self, key: &str) -> Result<bool> {
        let Some(id) = self.rules.find_id(key).await? else {
            debug!(key = %key, "Increment for unknown rule");
            return Ok(false);
        };
        self.counters.incr(&id).await?;
        Ok(true)
    }

    /// Reset every tracked segment's counter for `key` to a fresh window,
    /// without waiting for natural expiry. The rule itself is untouched.
    ///
    /// Returns `false` if no rule exists for `key`.
    pub async fn clear(&self, key: &str) -> Result<bool> {
        let Some(id) = self.rules.find_id(key).await? else {
            return Ok(false);
        };
        self.counters.clear(&id).await?;
        Ok(true)
    }

    /// Current counter value for one segment of the rule for `key`; 0 when
    /// the rule is unknown or the counter's window has expired.
    pub async fn read(&self, key: &str, segment: TimeSegment) -> Result<u64> {
        let Some(id) = self.rules.find_id(key).await? else {
            return Ok(0);
        };
        self.counters.read(&id, segment).await
    }

    /// Usage snapshot and allow/deny verdict for the rule for `key`; `None`
    /// if the rule does not exist.
    pub async fn stats(&self, key: &str) -> Result<Option<StatsSnapshot>> {
        let Some(rule) = self.rules.find(key).await? else {
            return Ok(None);
        };
        let counters = self.counters.read_all(&rule.id).await?;
        Ok(Some(StatsSnapshot::evaluate(&rule, counters)))
    }
}
