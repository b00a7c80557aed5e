//! Version source priorities
//!
//! A priority list is an ordered set of match rules, highest priority
//! first. An entry's rank is the position of the first rule matching its
//! source. Every list ends in an implicit catch-all so each entry gets a
//! rank, including entries with no source at all.

use crate::error::{FrameworkError, FrameworkResult};
use regex::Regex;

/// Environment variable that pins the framework version
pub const ENV_VERSION_SOURCE: &str = "BP_DOTNET_FRAMEWORK_VERSION";

/// Legacy per-app configuration file
pub const BUILDPACK_YML_SOURCE: &str = "buildpack.yml";

/// ASP.NET framework declared in runtimeconfig.json
pub const RUNTIMECONFIG_ASPNET_SOURCE: &str = "runtimeconfig.json ASP.NET";

/// .NET runtime declared in runtimeconfig.json
pub const RUNTIMECONFIG_RUNTIME_SOURCE: &str = "runtimeconfig.json .NET Runtime";

/// Generic runtimeconfig.json requirement
pub const RUNTIMECONFIG_SOURCE: &str = "runtimeconfig.json";

/// Requirement raised by the execute step when it needs no specific framework
pub const EXECUTE_BUILDPACK_SOURCE: &str = ".NET Execute Buildpack";

/// Project files (`*.csproj`, `*.fsproj`, `*.vbproj`)
pub const PROJECT_FILE_PATTERN: &str = r".*\.(cs|fs|vb)proj";

/// A single precedence rule
#[derive(Debug, Clone)]
pub enum MatchRule {
    /// Source label must equal the string
    Exact(String),

    /// Source label must match the expression
    Pattern(Regex),

    /// Matches anything, including an absent source
    Any,
}

impl MatchRule {
    /// Compile a pattern rule
    pub fn pattern(expr: &str) -> FrameworkResult<Self> {
        Regex::new(expr)
            .map(Self::Pattern)
            .map_err(|source| FrameworkError::PriorityPattern {
                pattern: expr.to_string(),
                source,
            })
    }

    /// Whether this rule accepts the given source
    pub fn matches(&self, source: Option<&str>) -> bool {
        match (self, source) {
            (Self::Any, _) => true,
            (Self::Exact(label), Some(source)) => label == source,
            (Self::Pattern(re), Some(source)) => re.is_match(source),
            (_, None) => false,
        }
    }
}

/// Ordered precedence rules, highest priority first
#[derive(Debug, Clone)]
pub struct PriorityList {
    rules: Vec<MatchRule>,
}

impl PriorityList {
    /// Build a list from explicit rules; the catch-all is appended here
    pub fn new(rules: impl IntoIterator<Item = MatchRule>) -> Self {
        let mut rules: Vec<MatchRule> = rules
            .into_iter()
            .filter(|rule| !matches!(rule, MatchRule::Any))
            .collect();
        rules.push(MatchRule::Any);
        Self { rules }
    }

    /// Fixed priority order for the ASP.NET Core framework
    pub fn aspnet() -> FrameworkResult<Self> {
        Ok(Self::new([
            MatchRule::Exact(ENV_VERSION_SOURCE.to_string()),
            MatchRule::Exact(BUILDPACK_YML_SOURCE.to_string()),
            MatchRule::pattern(PROJECT_FILE_PATTERN)?,
            MatchRule::Exact(RUNTIMECONFIG_ASPNET_SOURCE.to_string()),
            MatchRule::Exact(RUNTIMECONFIG_RUNTIME_SOURCE.to_string()),
            MatchRule::Exact(RUNTIMECONFIG_SOURCE.to_string()),
            MatchRule::Exact(EXECUTE_BUILDPACK_SOURCE.to_string()),
        ]))
    }

    /// Rank of a source: index of the first matching rule (lower is better)
    pub fn rank(&self, source: Option<&str>) -> usize {
        self.rules
            .iter()
            .position(|rule| rule.matches(source))
            .unwrap_or(self.rules.len())
    }

    /// Rank given to sources no explicit rule matches
    pub fn unknown_rank(&self) -> usize {
        self.rules.len() - 1
    }

    /// Number of rules including the catch-all
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// A list always contains at least the catch-all
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_rules_rank_in_order() {
        let list = PriorityList::new([
            MatchRule::Exact("env".to_string()),
            MatchRule::Exact("buildpack.yml".to_string()),
        ]);

        assert_eq!(list.rank(Some("env")), 0);
        assert_eq!(list.rank(Some("buildpack.yml")), 1);
        assert_eq!(list.rank(Some("something else")), 2);
        assert_eq!(list.rank(None), 2);
        assert_eq!(list.unknown_rank(), 2);
    }

    #[test]
    fn project_files_match_pattern() {
        let list = PriorityList::aspnet().unwrap();
        let project_rank = list.rank(Some("my-app.csproj"));

        assert_eq!(project_rank, 2);
        assert_eq!(list.rank(Some("my-app.fsproj")), project_rank);
        assert_eq!(list.rank(Some("My.App.vbproj")), project_rank);
        assert_eq!(list.rank(Some("my-app.sln")), list.unknown_rank());
    }

    #[test]
    fn aspnet_priorities_prefer_env() {
        let list = PriorityList::aspnet().unwrap();
        assert!(list.rank(Some(ENV_VERSION_SOURCE)) < list.rank(Some(BUILDPACK_YML_SOURCE)));
        assert!(
            list.rank(Some(RUNTIMECONFIG_ASPNET_SOURCE))
                < list.rank(Some(RUNTIMECONFIG_RUNTIME_SOURCE))
        );
        assert!(list.rank(Some(EXECUTE_BUILDPACK_SOURCE)) < list.unknown_rank());
        assert_eq!(list.len(), 8);
    }

    #[test]
    fn explicit_catch_all_is_not_duplicated() {
        let list = PriorityList::new([MatchRule::Any, MatchRule::Exact("a".to_string())]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.rank(Some("a")), 0);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = MatchRule::pattern("(unclosed").unwrap_err();
        assert!(err.to_string().contains("invalid priority pattern"));
    }
}
