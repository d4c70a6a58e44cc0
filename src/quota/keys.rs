//! Backing-store key layout.

use crate::segment::TimeSegment;

/// Deterministic key layout under a configurable namespace prefix.
///
/// - `<prefix>:rules:key:<key>` -> rule identifier
/// - `<prefix>:rules:id:<id>` -> rule metadata hash
/// - `<prefix>:counters:<id>:<segment>` -> windowed counter
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    /// Create a key space under the given namespace prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key holding the `key -> id` mapping for a rule.
    pub fn rule_key(&self, key: &str) -> String {
        format!("{}:rules:key:{}", self.prefix, key)
    }

    /// Key holding the metadata hash for a rule identifier.
    pub fn rule_id(&self, id: &str) -> String {
        format!("{}:rules:id:{}", self.prefix, id)
    }

    /// Key holding one (identifier, segment) counter.
    pub fn counter(&self, id: &str, segment: TimeSegment) -> String {
        format!("{}:counters:{}:{}", self.prefix, id, segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let keys = KeySpace::new("floodgate");
        assert_eq!(keys.rule_key("api"), "floodgate:rules:key:api");
        assert_eq!(keys.rule_id("abc-123"), "floodgate:rules:id:abc-123");
        assert_eq!(
            keys.counter("abc-123", TimeSegment::Minute),
            "floodgate:counters:abc-123:minute"
        );
    }
}
