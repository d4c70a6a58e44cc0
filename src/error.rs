//! Error types for the Floodgate engine.

use thiserror::Error;

/// Main error type for Floodgate operations.
///
/// Absence of a rule is never modeled as an error: `find`, `stats` and the
/// identifier lookups return `Option`/`bool` instead, since probing unknown
/// keys is a routine caller operation.
#[derive(Error, Debug)]
pub enum FloodgateError {
    /// An unrecognized time-segment name was supplied.
    #[error("invalid time segment: {0:?}")]
    InvalidSegment(String),

    /// A rule was created with a non-positive `max`.
    #[error("max must be a positive integer, got {0}")]
    InvalidMax(u64),

    /// A human-readable duration string could not be parsed.
    #[error("invalid duration: {0:?}")]
    ParseDuration(String),

    /// A rule already exists for the given key.
    #[error("a rule already exists for key {0:?}")]
    DuplicateKey(String),

    /// The backing store was unreachable or a command failed.
    ///
    /// The engine performs no internal retry; callers decide retry policy.
    #[error("backing store unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration-related errors.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<redis::RedisError> for FloodgateError {
    fn from(err: redis::RedisError) -> Self {
        FloodgateError::StoreUnavailable(Box::new(err))
    }
}

/// Result type alias for Floodgate operations.
pub type Result<T> = std::result::Result<T, FloodgateError>;
