//! Configuration for the Floodgate engine.

use serde::{Deserialize, Serialize};

use crate::segment::TimeSegment;

/// Configuration for a [`Floodgate`](crate::Floodgate) instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodgateConfig {
    /// Namespace prefix for every backing-store key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Time segments tracked for every rule, in addition to whichever one a
    /// rule enforces.
    #[serde(default = "default_time_segments")]
    pub time_segments: Vec<TimeSegment>,
}

impl Default for FloodgateConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            time_segments: default_time_segments(),
        }
    }
}

fn default_key_prefix() -> String {
    "floodgate".to_string()
}

fn default_time_segments() -> Vec<TimeSegment> {
    TimeSegment::ALL.to_vec()
}

impl FloodgateConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| crate::error::FloodgateError::Config(e.to_string()))?;
        let config: FloodgateConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::FloodgateError::Config(e.to_string()))?;
        Ok(config)
    }
}
