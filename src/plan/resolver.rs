//! Candidate merging
//!
//! Reduces every requirement entry for one dependency to a single winner.
//! Version and flags are computed independently over the whole filtered
//! set:
//! - the version and its source come from the best-ranked entry that
//!   carries a version, so a flags-only entry never displaces it
//! - the flags are the OR of all entries, regardless of rank
//!
//! When no entry carries a version the winner is the best-ranked entry
//! with an absent version, which asks for the catalog default.

use crate::plan::entry::{RequirementEntry, RequirementFlags};
use crate::plan::priority::PriorityList;
use tracing::debug;

/// Outcome of merging the candidates for one dependency
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Merged winning entry, `None` when nothing requested the dependency
    pub winner: Option<RequirementEntry>,

    /// All candidates in priority order (stable within a rank)
    pub sorted: Vec<RequirementEntry>,
}

/// Pick the winning requirement for `name`.
pub fn resolve(name: &str, entries: &[RequirementEntry], priorities: &PriorityList) -> Resolution {
    let mut ranked: Vec<(usize, &RequirementEntry)> = entries
        .iter()
        .filter(|entry| entry.name == name)
        .map(|entry| (priorities.rank(entry.source.as_deref()), entry))
        .collect();

    // sort_by_key is stable, so equal ranks keep their input order
    ranked.sort_by_key(|(rank, _)| *rank);

    let sorted: Vec<RequirementEntry> = ranked.iter().map(|(_, e)| (*e).clone()).collect();

    let Some(&(_, best)) = ranked.first() else {
        debug!("No requirement entries for {}", name);
        return Resolution {
            winner: None,
            sorted,
        };
    };

    let version_winner = ranked
        .iter()
        .map(|(_, entry)| *entry)
        .find(|entry| entry.version.is_some())
        .unwrap_or(best);

    let winner = RequirementEntry {
        name: name.to_string(),
        version: version_winner.version.clone(),
        source: version_winner.source.clone(),
        flags: merge_flags(sorted.iter()),
    };

    debug!(
        "Resolved {} from {} candidate(s): {}",
        name,
        sorted.len(),
        winner
    );

    Resolution {
        winner: Some(winner),
        sorted,
    }
}

/// OR together the flags of every entry for `name`.
pub fn merge_layer_types(name: &str, entries: &[RequirementEntry]) -> RequirementFlags {
    merge_flags(entries.iter().filter(|entry| entry.name == name))
}

fn merge_flags<'a>(entries: impl Iterator<Item = &'a RequirementEntry>) -> RequirementFlags {
    entries.fold(RequirementFlags::default(), |acc, entry| acc | entry.flags)
}
