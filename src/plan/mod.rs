//! Requirement entries and candidate merging
//!
//! Every source that cares about the framework version contributes
//! [`RequirementEntry`] values. The resolver ranks them against a fixed
//! [`PriorityList`] and reduces them to one winner per dependency.

pub mod entry;
pub mod priority;
pub mod resolver;
#[cfg(test)]
mod resolver_proptest;
pub mod sources;

pub use entry::{RequirementEntry, RequirementFlags, ANY_VERSION, UNKNOWN_SOURCE};
pub use priority::{MatchRule, PriorityList};
pub use resolver::{merge_layer_types, resolve, Resolution};
pub use sources::BuildEnvironment;
