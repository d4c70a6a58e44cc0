//! Usage snapshots and the allow/deny decision.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::segment::TimeSegment;

use super::rule::Rule;

/// A point-in-time view of a rule's usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Current counter value for every tracked segment.
    pub counters: BTreeMap<TimeSegment, u64>,
    /// Whether the rule's own segment is still below its `max`.
    pub allowed: bool,
    /// Percent of quota used on the rule's own segment, as a fixed-point
    /// two-decimal string (e.g. `"10.00"`). Deliberately not clamped: values
    /// above `100.00` report over-quota severity.
    pub percent: String,
}

impl StatsSnapshot {
    /// Evaluate a rule against its current counters.
    pub fn evaluate(rule: &Rule, counters: BTreeMap<TimeSegment, u64>) -> Self {
        let used = counters.get(&rule.time).copied().unwrap_or(0);
        let allowed = used < rule.max;
        let percent = format!("{:.2}", used as f64 / rule.max as f64 * 100.0);

        Self {
            counters,
            allowed,
            percent,
        }
    }
}
