//! In-process backing store.
//!
//! Suitable for tests and single-process deployments only: counters are not
//! shared across instances. Expiry is enforced lazily, on access, against the
//! wall clock.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;
use crate::segment::now_epoch;

use super::CounterStore;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Int(u64),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<u64>,
}

impl Entry {
    fn expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A [`CounterStore`] backed by an in-process concurrent map.
///
/// Increments are atomic under the map's per-shard lock, which gives the same
/// "post-increment value of 1 marks the window creator" guarantee the engine
/// relies on from Redis.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop an entry whose expiry has passed.
    fn purge_expired(&self, key: &str, now: u64) {
        if let Some(entry) = self.entries.get(key) {
            if entry.expired(now) {
                drop(entry);
                self.entries.remove(key);
            }
        }
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = now_epoch();
        self.purge_expired(key, now);
        Ok(self.entries.get(key).map(|e| match &e.value {
            Value::Str(s) => s.clone(),
            Value::Int(n) => n.to_string(),
            Value::Hash(_) => String::new(),
        }))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool> {
        let now = now_epoch();
        self.purge_expired(key, now);
        let mut created = false;
        self.entries.entry(key.to_string()).or_insert_with(|| {
            created = true;
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: None,
            }
        });
        Ok(created)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = now_epoch();
        self.purge_expired(key, now);
        Ok(self.entries.remove(key).is_some())
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        let now = now_epoch();
        let mut entry = self.entries.entry(key.to_string()).or_insert(Entry {
            value: Value::Int(0),
            expires_at: None,
        });
        if entry.expired(now) {
            *entry = Entry {
                value: Value::Int(0),
                expires_at: None,
            };
        }
        let next = match &entry.value {
            Value::Int(n) => n + 1,
            Value::Str(s) => s.parse::<u64>().unwrap_or(0) + 1,
            Value::Hash(_) => 1,
        };
        entry.value = Value::Int(next);
        Ok(next)
    }

    async fn expire_at(&self, key: &str, at_epoch: u64) -> Result<bool> {
        let now = now_epoch();
        self.purge_expired(key, now);
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(at_epoch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn hash_set(&self, key: &str, fields: &[(&str, String)]) -> Result<()> {
        let mut entry = self.entries.entry(key.to_string()).or_insert(Entry {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        if !matches!(entry.value, Value::Hash(_)) {
            entry.value = Value::Hash(HashMap::new());
        }
        if let Value::Hash(map) = &mut entry.value {
            for (field, value) in fields {
                map.insert(field.to_string(), value.clone());
            }
        }
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>> {
        let now = now_epoch();
        self.purge_expired(key, now);
        Ok(self
            .entries
            .get(key)
            .and_then(|e| match &e.value {
                Value::Hash(map) => Some(map.clone()),
                _ => None,
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_incr_creates_at_one() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("c").await.unwrap(), 1);
        assert_eq!(store.incr("c").await.unwrap(), 2);
        assert_eq!(store.get("c").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_set_nx_only_first_write_wins() {
        let store = MemoryStore::new();
        assert!(store.set_nx("k", "a").await.unwrap());
        assert!(!store.set_nx("k", "b").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("a".to_string()));
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store.incr("c").await.unwrap();
        // Expiry in the past.
        assert!(store.expire_at("c", now_epoch() - 1).await.unwrap());
        assert_eq!(store.get("c").await.unwrap(), None);
        // A fresh increment restarts the window at 1.
        assert_eq!(store.incr("c").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expire_at_missing_key() {
        let store = MemoryStore::new();
        assert!(!store.expire_at("nope", now_epoch() + 60).await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_round_trip() {
        let store = MemoryStore::new();
        store
            .hash_set("h", &[("max", "10".to_string()), ("time", "minute".to_string())])
            .await
            .unwrap();
        let fields = store.hash_get_all("h").await.unwrap();
        assert_eq!(fields.get("max").map(String::as_str), Some("10"));
        assert_eq!(fields.get("time").map(String::as_str), Some("minute"));
        assert!(store.hash_get_all("absent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }
}
