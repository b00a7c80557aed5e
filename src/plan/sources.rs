//! Requirement sources outside the runtime descriptor
//!
//! Entries can come from:
//! 1. `BP_DOTNET_FRAMEWORK_VERSION`, captured once into [`BuildEnvironment`]
//! 2. The legacy `buildpack.yml` in the application directory
//! 3. An incoming build plan file (`[[entries]]` in TOML)

use crate::error::{FrameworkError, FrameworkResult};
use crate::plan::entry::RequirementEntry;
use crate::plan::priority::{BUILDPACK_YML_SOURCE, ENV_VERSION_SOURCE};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Explicit snapshot of the environment values that influence resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    /// Value of `BP_DOTNET_FRAMEWORK_VERSION`, if set and non-empty
    pub framework_version: Option<String>,
}

impl BuildEnvironment {
    /// Capture the relevant variables from the current process
    pub fn from_process() -> Self {
        let framework_version = std::env::var(ENV_VERSION_SOURCE)
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self { framework_version }
    }

    /// Requirement entries contributed by the environment
    pub fn entries(&self, name: &str) -> Vec<RequirementEntry> {
        self.framework_version
            .iter()
            .map(|version| {
                RequirementEntry::new(name)
                    .with_version(version.clone())
                    .with_source(ENV_VERSION_SOURCE)
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct BuildpackYml {
    #[serde(default, rename = "dotnet-framework")]
    framework: FrameworkSection,
}

#[derive(Debug, Default, Deserialize)]
struct FrameworkSection {
    #[serde(default)]
    version: Option<String>,
}

/// Read the framework version from `<working_dir>/buildpack.yml`.
///
/// A missing file or an empty version yields `None`.
pub async fn parse_buildpack_yml(working_dir: &Path) -> FrameworkResult<Option<String>> {
    let path = working_dir.join(BUILDPACK_YML_SOURCE);
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .await
        .map_err(|e| FrameworkError::io(format!("reading {}", path.display()), e))?;

    if content.trim().is_empty() {
        return Ok(None);
    }

    let parsed: BuildpackYml =
        serde_yaml::from_str(&content).map_err(|e| FrameworkError::BuildpackYaml {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    let version = parsed.framework.version.filter(|v| !v.trim().is_empty());
    debug!("buildpack.yml framework version: {:?}", version);
    Ok(version)
}

/// Requirement entries contributed by `buildpack.yml`
pub async fn buildpack_yml_entries(
    working_dir: &Path,
    name: &str,
) -> FrameworkResult<Vec<RequirementEntry>> {
    Ok(parse_buildpack_yml(working_dir)
        .await?
        .map(|version| {
            RequirementEntry::new(name)
                .with_version(version)
                .with_source(BUILDPACK_YML_SOURCE)
        })
        .into_iter()
        .collect())
}

#[derive(Debug, Default, Deserialize)]
struct PlanFile {
    #[serde(default)]
    entries: Vec<RequirementEntry>,
}

/// Load requirement entries from a build plan file
pub async fn load_plan(path: &Path) -> FrameworkResult<Vec<RequirementEntry>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| FrameworkError::io(format!("reading build plan {}", path.display()), e))?;

    let plan: PlanFile = toml::from_str(&content).map_err(|e| FrameworkError::PlanInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!("Loaded {} plan entries from {}", plan.entries.len(), path.display());
    Ok(plan.entries)
}
