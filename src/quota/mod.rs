//! Quota rules, counters, and usage evaluation.

mod counter;
mod keys;
mod rule;
mod stats;

pub use counter::CounterEngine;
pub use keys::KeySpace;
pub use rule::{CreateParams, Rule, RuleStore, UpdatePatch};
pub use stats::StatsSnapshot;
