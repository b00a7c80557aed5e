//! Property-based tests for candidate merging.

use crate::plan::entry::{RequirementEntry, RequirementFlags};
use crate::plan::priority::{MatchRule, PriorityList};
use crate::plan::resolver::{merge_layer_types, resolve};
use proptest::prelude::*;

const NAME: &str = "dotnet-aspnetcore";
const LABELS: [&str; 4] = ["env", "buildpack.yml", "app.csproj", "runtimeconfig.json"];

fn priorities() -> PriorityList {
    PriorityList::new([
        MatchRule::Exact("env".to_string()),
        MatchRule::Exact("buildpack.yml".to_string()),
        MatchRule::Pattern(regex::Regex::new(r"\.csproj$").unwrap()),
    ])
}

fn arb_entry() -> impl Strategy<Value = RequirementEntry> {
    (
        prop::option::of(0..LABELS.len()),
        prop::option::of("[0-9]\\.[0-9]\\.[0-9*]"),
        any::<bool>(),
        any::<bool>(),
        prop::bool::weighted(0.85),
    )
        .prop_map(|(label, version, build, launch, same_name)| {
            let name = if same_name { NAME } else { "dotnet-runtime" };
            let mut entry =
                RequirementEntry::new(name).with_flags(RequirementFlags { build, launch });
            entry.source = label.map(|i| LABELS[i].to_string());
            entry.version = version;
            entry
        })
}

proptest! {
    /// Property: the version winner is ranked no worse than any version-bearing entry
    #[test]
    fn winner_has_best_rank(entries in prop::collection::vec(arb_entry(), 0..8)) {
        let list = priorities();
        let resolution = resolve(NAME, &entries, &list);
        let relevant: Vec<&RequirementEntry> = entries.iter().filter(|e| e.name == NAME).collect();

        match resolution.winner {
            None => prop_assert!(relevant.is_empty()),
            Some(winner) => {
                let winner_rank = list.rank(winner.source.as_deref());
                let pool: Vec<&&RequirementEntry> = if relevant.iter().any(|e| e.version.is_some()) {
                    relevant.iter().filter(|e| e.version.is_some()).collect()
                } else {
                    relevant.iter().collect()
                };
                for other in pool {
                    prop_assert!(winner_rank <= list.rank(other.source.as_deref()));
                }
            }
        }
    }

    /// Property: sorted candidates are ordered by rank and keep every relevant entry
    #[test]
    fn sorted_is_rank_ordered(entries in prop::collection::vec(arb_entry(), 0..8)) {
        let list = priorities();
        let resolution = resolve(NAME, &entries, &list);
        let ranks: Vec<usize> = resolution
            .sorted
            .iter()
            .map(|e| list.rank(e.source.as_deref()))
            .collect();

        prop_assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(
            resolution.sorted.len(),
            entries.iter().filter(|e| e.name == NAME).count()
        );
    }

    /// Property: flag merging does not depend on entry order
    #[test]
    fn flag_merge_is_order_independent(entries in prop::collection::vec(arb_entry(), 0..8)) {
        let mut reversed = entries.clone();
        reversed.reverse();

        prop_assert_eq!(merge_layer_types(NAME, &entries), merge_layer_types(NAME, &reversed));
    }

    /// Property: merging in two halves equals merging everything at once
    #[test]
    fn flag_merge_is_associative(
        entries in prop::collection::vec(arb_entry(), 0..8),
        split in 0usize..8,
    ) {
        let split = split.min(entries.len());
        let (left, right) = entries.split_at(split);

        prop_assert_eq!(
            merge_layer_types(NAME, left) | merge_layer_types(NAME, right),
            merge_layer_types(NAME, &entries)
        );
    }
}
