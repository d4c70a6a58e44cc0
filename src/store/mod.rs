//! Backing-store abstraction.
//!
//! The engine keeps no state of its own between calls; everything durable
//! lives behind the [`CounterStore`] trait. The trait captures exactly the
//! primitives the engine relies on for correctness: atomic increment (whose
//! return value identifies the caller that created a fresh window), absolute
//! expiry, create-if-absent, and a small hash-record surface for rule
//! metadata.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

mod memory;
mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

/// Trait for backing-store implementations.
///
/// All operations are a single store round trip; any of them may fail with
/// [`FloodgateError::StoreUnavailable`](crate::FloodgateError::StoreUnavailable).
/// Increments on the same key from concurrent callers are serialized by the
/// store, never by the engine.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a string value, `None` if the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a string value, unconditionally.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write a string value only if the key does not already exist.
    ///
    /// Returns `true` if the write happened. This is the atomic
    /// duplicate-detection primitive: no separate existence check precedes it.
    async fn set_nx(&self, key: &str, value: &str) -> Result<bool>;

    /// Delete a key. Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Atomically increment an integer key, creating it at 1 if absent.
    ///
    /// Returns the post-increment value; a return of exactly 1 means this
    /// caller created the key.
    async fn incr(&self, key: &str) -> Result<u64>;

    /// Set an absolute expiry (epoch seconds) on a key.
    ///
    /// Returns `false` if the key does not exist.
    async fn expire_at(&self, key: &str, at_epoch: u64) -> Result<bool>;

    /// Write fields of a hash record.
    async fn hash_set(&self, key: &str, fields: &[(&str, String)]) -> Result<()>;

    /// Read all fields of a hash record; empty map if the key is absent.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>>;
}
