//! Rule records and their lifecycle.
//!
//! A rule is one quota policy: a caller-chosen key, a ceiling of permitted
//! events per window, and the time segment the ceiling is measured against.
//! The store holds two records per rule, a `key -> id` mapping and an
//! `id -> metadata` hash; a rule is visible iff both exist.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{FloodgateError, Result};
use crate::segment::TimeSegment;
use crate::store::CounterStore;

use super::keys::KeySpace;

/// A named quota policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Generated identifier, immutable, assigned at creation.
    pub id: String,
    /// Caller-chosen key, unique across rules.
    pub key: String,
    /// Ceiling of permitted events per window.
    pub max: u64,
    /// The time segment this rule is enforced against.
    pub time: TimeSegment,
}

/// Parameters for creating a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateParams {
    /// Caller-chosen key for the rule.
    pub key: String,
    /// Ceiling of permitted events per window; must be positive.
    pub max: u64,
    /// The time segment the ceiling is measured against.
    pub time: TimeSegment,
}

/// Patch applied by `update`.
///
/// Only `max` is mutable post-creation. Changing `time` would silently orphan
/// counter keys under the old segment, so the patch deliberately carries no
/// `time` field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatch {
    /// New ceiling, if changing.
    pub max: Option<u64>,
}

/// Store-backed rule records.
pub struct RuleStore {
    store: Arc<dyn CounterStore>,
    keys: KeySpace,
    segments: Vec<TimeSegment>,
}

impl RuleStore {
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

    /// Create a new rule.
    ///
    /// The enforced segment must be one of the tracked segments: a rule on an
    /// untracked segment would never have its counter incremented, so its
    /// quota could never be reached.
    ///
    /// The `key -> id` mapping is written first, with a create-if-absent
    /// write that doubles as atomic duplicate detection; the metadata hash
    /// follows. Between the two writes the rule reads as not-found, never as
    /// partially created.
    pub async fn create(&self, params: CreateParams) -> Result<Rule> {
        if params.max == 0 {
            return Err(FloodgateError::InvalidMax(params.max));
        }
        if !self.segments.contains(&params.time) {
            return Err(FloodgateError::InvalidSegment(params.time.to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let created = self
            .store
            .set_nx(&self.keys.rule_key(&params.key), &id)
            .await?;
        if !created {
            return Err(FloodgateError::DuplicateKey(params.key));
        }

        let rule = Rule {
            id,
            key: params.key,
            max: params.max,
            time: params.time,
        };
        self.write_metadata(&rule).await?;

        debug!(key = %rule.key, id = %rule.id, max = rule.max, time = %rule.time, "Created rule");
        Ok(rule)
    }

    /// Find a rule by key; `None` if it does not exist.
    ///
    /// A dangling identifier mapping with missing or unreadable metadata is
    /// treated as not-found rather than an error (self-healing read).
    pub async fn find(&self, key: &str) -> Result<Option<Rule>> {
        let Some(id) = self.find_id(key).await? else {
            return Ok(None);
        };
        self.load(&id).await
    }

    /// Resolve the `key -> id` mapping without loading metadata.
    pub async fn find_id(&self, key: &str) -> Result<Option<String>> {
        self.store.get(&self.keys.rule_key(key)).await
    }

    /// Update a rule in place. Returns `false` if no rule exists for `key`.
    pub async fn update(&self, key: &str, patch: UpdatePatch) -> Result<bool> {
        let Some(mut rule) = self.find(key).await? else {
            return Ok(false);
        };

        if let Some(max) = patch.max {
            if max == 0 {
                return Err(FloodgateError::InvalidMax(max));
            }
            rule.max = max;
        }
        self.write_metadata(&rule).await?;

        debug!(key = %rule.key, id = %rule.id, max = rule.max, "Updated rule");
        Ok(true)
    }

    /// Delete a rule's mapping and metadata. Returns the identifier that was
    /// mapped, so the caller can also drop the rule's counters.
    pub async fn remove(&self, key: &str) -> Result<Option<String>> {
        let Some(id) = self.find_id(key).await? else {
            return Ok(None);
        };

        self.store.delete(&self.keys.rule_id(&id)).await?;
        self.store.delete(&self.keys.rule_key(key)).await?;

        debug!(key = %key, id = %id, "Removed rule");
        Ok(Some(id))
    }

    async fn write_metadata(&self, rule: &Rule) -> Result<()> {
        let fields = [
            ("key", rule.key.clone()),
            ("max", rule.max.to_string()),
            ("time", rule.time.to_string()),
        ];
        self.store
            .hash_set(&self.keys.rule_id(&rule.id), &fields)
            .await
    }

    async fn load(&self, id: &str) -> Result<Option<Rule>> {
        let fields = self.store.hash_get_all(&self.keys.rule_id(id)).await?;

        let rule = (|| {
            let key = fields.get("key")?.clone();
            let max = fields.get("max")?.parse().ok()?;
            let time = TimeSegment::from_str(fields.get("time")?).ok()?;
            Some(Rule {
                id: id.to_string(),
                key,
                max,
                time,
            })
        })();
        Ok(rule)
    }
}
