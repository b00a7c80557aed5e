//! Build log formatting
//!
//! Pure functions that render candidate lists, the selected dependency and
//! the configured environment as log lines. Callers decide the log level.

use crate::dependency::ResolvedDependency;
use crate::plan::RequirementEntry;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Days before the deprecation date that a warning is emitted
pub const DEPRECATION_WARNING_DAYS: i64 = 30;

/// Lines describing every candidate in priority order
pub fn candidate_lines(entries: &[RequirementEntry]) -> Vec<String> {
    if entries.is_empty() {
        return Vec::new();
    }

    let width = entries
        .iter()
        .map(|e| e.source_label().len())
        .max()
        .unwrap_or(0);

    let mut lines = vec!["Candidate version sources (in priority order):".to_string()];
    lines.extend(entries.iter().map(|entry| {
        format!(
            "  {:<width$} -> \"{}\"",
            entry.source_label(),
            entry.version_label(),
            width = width
        )
    }));
    lines
}

/// Where a dependency is in its support lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deprecation {
    Supported,
    /// Deprecation date is within the warning window
    Upcoming(DateTime<Utc>),
    Deprecated,
}

impl Deprecation {
    pub fn at(deprecation_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match deprecation_date {
            Some(date) if now >= date => Self::Deprecated,
            Some(date) if now + Duration::days(DEPRECATION_WARNING_DAYS) >= date => {
                Self::Upcoming(date)
            }
            _ => Self::Supported,
        }
    }
}

/// The selection line and any deprecation warnings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub line: String,
    pub warnings: Vec<String>,
}

/// Describe the dependency chosen for `entry`
pub fn selection(
    entry: &RequirementEntry,
    dependency: &ResolvedDependency,
    now: DateTime<Utc>,
) -> Selection {
    let line = format!(
        "Selected {} version (using {}): {}",
        dependency.name,
        entry.source_label(),
        dependency.version
    );

    let warnings = match Deprecation::at(dependency.deprecation_date, now) {
        Deprecation::Supported => Vec::new(),
        Deprecation::Upcoming(date) => vec![
            format!(
                "Version {} of {} will be deprecated after {}.",
                dependency.version,
                dependency.name,
                date.format("%Y-%m-%d")
            ),
            format!(
                "Migrate your application to a supported version of {} before this time.",
                dependency.name
            ),
        ],
        Deprecation::Deprecated => vec![
            format!("Version {} of {} is deprecated.", dependency.version, dependency.name),
            format!(
                "Migrate your application to a supported version of {}.",
                dependency.name
            ),
        ],
    };

    Selection { line, warnings }
}

/// Lines describing the shared environment of a layer
pub fn environment_lines(env: &BTreeMap<String, String>) -> Vec<String> {
    if env.is_empty() {
        return Vec::new();
    }

    let mut lines = vec!["Configuring environment".to_string()];
    lines.extend(
        env.iter()
            .map(|(name, value)| format!("  {} -> \"{}\"", name, value)),
    );
    lines
}
