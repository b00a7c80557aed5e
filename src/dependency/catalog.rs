//! Dependency catalog
//!
//! The catalog is the buildpack's `buildpack.toml`. It lists every
//! downloadable artifact under `[[metadata.dependencies]]` and the default
//! constraint per dependency under `[metadata.default-versions]`.

use crate::error::{FrameworkError, FrameworkResult};
use chrono::{DateTime, NaiveDate, Utc};
use semver::{Version, VersionReq};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Stack entry that matches every stack
pub const ANY_STACK: &str = "*";

/// A dependency picked from the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub id: String,
    pub name: String,
    pub version: String,
    /// SHA-256 of the artifact, the cache key for the layer
    pub sha256: String,
    pub stacks: Vec<String>,
    pub uri: String,
    pub source: Option<String>,
    pub source_sha256: Option<String>,
    pub deprecation_date: Option<DateTime<Utc>>,
    pub licenses: Vec<String>,
    pub purl: Option<String>,
    pub cpe: Option<String>,
}

/// Identity of the buildpack that owns the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuildpackInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    buildpack: BuildpackInfo,

    #[serde(default)]
    metadata: CatalogMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogMetadata {
    #[serde(default, rename = "default-versions")]
    default_versions: HashMap<String, String>,

    #[serde(default)]
    dependencies: Vec<CatalogDependency>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogDependency {
    id: String,
    #[serde(default)]
    name: String,
    version: String,
    #[serde(default)]
    sha256: Option<String>,
    /// `<algorithm>:<hex>`, newer catalogs use this instead of `sha256`
    #[serde(default)]
    checksum: Option<String>,
    #[serde(default)]
    stacks: Vec<String>,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    source_sha256: Option<String>,
    #[serde(default)]
    deprecation_date: Option<toml::value::Datetime>,
    #[serde(default)]
    licenses: Vec<String>,
    #[serde(default)]
    purl: Option<String>,
    #[serde(default)]
    cpe: Option<String>,
}

impl CatalogDependency {
    fn supports_stack(&self, stack: &str) -> bool {
        self.stacks.iter().any(|s| s == stack || s == ANY_STACK)
    }

    fn sha256(&self) -> String {
        if let Some(sha) = &self.sha256 {
            return sha.clone();
        }
        self.checksum
            .as_deref()
            .map(|c| c.strip_prefix("sha256:").unwrap_or(c).to_string())
            .unwrap_or_default()
    }

    fn into_resolved(self) -> ResolvedDependency {
        let sha256 = self.sha256();
        let deprecation_date = self
            .deprecation_date
            .as_ref()
            .and_then(|d| parse_deprecation_date(&d.to_string()));

        ResolvedDependency {
            id: self.id,
            name: self.name,
            version: self.version,
            sha256,
            stacks: self.stacks,
            uri: self.uri,
            source: self.source,
            source_sha256: self.source_sha256,
            deprecation_date,
            licenses: self.licenses,
            purl: self.purl,
            cpe: self.cpe,
        }
    }
}

fn parse_deprecation_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parsed `buildpack.toml`
#[derive(Debug, Default)]
pub struct Catalog {
    buildpack: BuildpackInfo,
    default_versions: HashMap<String, String>,
    dependencies: Vec<CatalogDependency>,
}

impl Catalog {
    /// Load a catalog from disk
    pub async fn load(path: &Path) -> FrameworkResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            FrameworkError::io(format!("reading dependency catalog {}", path.display()), e)
        })?;
        Self::parse(path, &content)
    }

    /// Parse catalog content; `path` is only used in error messages
    pub fn parse(path: &Path, content: &str) -> FrameworkResult<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(|e| FrameworkError::CatalogInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            buildpack: file.buildpack,
            default_versions: file.metadata.default_versions,
            dependencies: file.metadata.dependencies,
        })
    }

    /// The buildpack described by the catalog
    pub fn buildpack(&self) -> &BuildpackInfo {
        &self.buildpack
    }

    /// Pick the highest catalog version of `id` satisfying `version` on `stack`.
    ///
    /// An absent or empty constraint falls back to the catalog default for
    /// `id`, then to any version.
    pub fn resolve(
        &self,
        id: &str,
        version: Option<&str>,
        stack: &str,
    ) -> FrameworkResult<ResolvedDependency> {
        let constraint = version
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.default_versions.get(id).map(String::as_str))
            .unwrap_or("*");
        let matcher = VersionConstraint::parse(constraint)?;

        let candidates: Vec<&CatalogDependency> = self
            .dependencies
            .iter()
            .filter(|d| d.id == id && d.supports_stack(stack))
            .collect();

        let best = candidates
            .iter()
            .filter_map(|d| parse_catalog_version(&d.version).map(|v| (v, *d)))
            .filter(|(v, _)| matcher.matches(v))
            .max_by(|(a, _), (b, _)| a.cmp(b));

        match best {
            Some((version, dependency)) => {
                debug!("Constraint {} for {} resolved to {}", constraint, id, version);
                Ok(dependency.clone().into_resolved())
            }
            None => {
                let mut supported: Vec<&str> =
                    candidates.iter().map(|d| d.version.as_str()).collect();
                supported.sort_unstable();
                supported.dedup();
                Err(FrameworkError::DependencyNotFound {
                    id: id.to_string(),
                    constraint: constraint.to_string(),
                    stack: stack.to_string(),
                    supported: supported.join(", "),
                })
            }
        }
    }
}

/// Catalog versions are semver, but two-part versions like `6.0` are padded
fn parse_catalog_version(raw: &str) -> Option<Version> {
    Version::parse(raw)
        .or_else(|_| Version::parse(&format!("{}.0", raw)))
        .or_else(|_| Version::parse(&format!("{}.0.0", raw)))
        .ok()
}

/// A version constraint as written by users
#[derive(Debug, Clone, PartialEq)]
pub enum VersionConstraint {
    /// `*`: any released version
    Any,

    /// Dotted components where `None` is a wildcard (`6.0.*`, `2.5.x`, `2.2.5`)
    Components(Vec<Option<u64>>),

    /// An exact pre-release version (`7.0.0-rc.1`)
    Prerelease(Version),

    /// Explicit semver operators (`^6.0`, `>=6.0.0, <7.0.0`)
    Semver(VersionReq),
}

impl VersionConstraint {
    /// Parse a constraint string
    pub fn parse(raw: &str) -> FrameworkResult<Self> {
        let raw = raw.trim();
        let invalid = |reason: &str| FrameworkError::VersionConstraint {
            constraint: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() || raw == "*" {
            return Ok(Self::Any);
        }

        if raw.starts_with(['^', '~', '>', '<', '=']) {
            return VersionReq::parse(raw)
                .map(Self::Semver)
                .map_err(|e| invalid(&e.to_string()));
        }

        if raw.contains('-') {
            return Version::parse(raw)
                .map(Self::Prerelease)
                .map_err(|e| invalid(&e.to_string()));
        }

        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() > 3 {
            return Err(invalid("expected at most three components"));
        }

        let components = parts
            .iter()
            .map(|part| match *part {
                "*" | "x" | "X" => Ok(None),
                number => number
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|_| invalid(&format!("'{}' is not a number or wildcard", number))),
            })
            .collect::<FrameworkResult<Vec<_>>>()?;

        Ok(Self::Components(components))
    }

    /// Whether `version` satisfies this constraint
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => version.pre.is_empty(),
            Self::Prerelease(exact) => exact == version,
            Self::Semver(req) => req.matches(version),
            Self::Components(components) => {
                if !version.pre.is_empty() {
                    return false;
                }
                let actual = [version.major, version.minor, version.patch];
                components
                    .iter()
                    .zip(actual)
                    .all(|(want, have)| want.map_or(true, |w| w == have))
            }
        }
    }
}
