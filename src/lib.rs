//! Floodgate - Windowed-Counter Quota Engine
//!
//! This crate implements a quota / rate-limiting engine: callers define named
//! rules ("at most N events per time unit for key K"), record events against
//! them, and ask whether a key is currently within or over its quota. Durable
//! state is delegated to a shared backing store with atomic increment and
//! expiry primitives (Redis in production, an in-process store for tests and
//! single-process use), so multiple engine instances across processes can
//! serve the same rules without coordination.

pub mod config;
pub mod engine;
pub mod error;
pub mod quota;
pub mod segment;
pub mod store;

pub use config::FloodgateConfig;
pub use engine::Floodgate;
pub use error::{FloodgateError, Result};
pub use quota::{CreateParams, Rule, StatsSnapshot, UpdatePatch};
pub use segment::{parse_duration, TimeSegment};
pub use store::{CounterStore, MemoryStore, RedisStore};
