//! Redis-backed store.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::Result;

use super::CounterStore;

/// A [`CounterStore`] backed by Redis.
///
/// Every trait method is a single Redis command, so atomicity comes straight
/// from the server: `INCR` serializes concurrent increments and reports the
/// post-increment value, `SET NX` arbitrates duplicate rule creation, and
/// `EXPIREAT` pins counters to their window end.
///
/// The connection manager reconnects transparently; command failures surface
/// as [`FloodgateError::StoreUnavailable`](crate::FloodgateError::StoreUnavailable).
#[derive(Clone)]
pub struct RedisStore {
    connection_manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to a Redis server, e.g. `redis://127.0.0.1/`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let connection_manager = client.get_connection_manager().await?;
        Ok(Self { connection_manager })
    }

    /// Wrap an existing connection manager.
    pub fn from_connection_manager(connection_manager: ConnectionManager) -> Self {
        Self { connection_manager }
    }

    fn connection(&self) -> ConnectionManager {
        self.connection_manager.clone()
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self.connection().get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _: () = self.connection().set(key, value).await?;
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str) -> Result<bool> {
        let created: bool = self.connection().set_nx(key, value).await?;
        Ok(created)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed: u64 = self.connection().del(key).await?;
        Ok(removed > 0)
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        let value: u64 = self.connection().incr(key, 1u64).await?;
        Ok(value)
    }

    async fn expire_at(&self, key: &str, at_epoch: u64) -> Result<bool> {
        let set: bool = self.connection().expire_at(key, at_epoch as i64).await?;
        Ok(set)
    }

    async fn hash_set(&self, key: &str, fields: &[(&str, String)]) -> Result<()> {
        let _: () = self.connection().hset_multiple(key, fields).await?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>> {
        let fields: HashMap<String, String> = self.connection().hgetall(key).await?;
        Ok(fields)
    }
}
