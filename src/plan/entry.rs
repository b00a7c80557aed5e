//! Requirement entries
//!
//! A requirement entry is one source's request for a version and/or
//! build-phase flags of a named dependency.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Label shown for entries whose source is unknown
pub const UNKNOWN_SOURCE: &str = "<unknown>";

/// Version rendered for entries that do not pin one
pub const ANY_VERSION: &str = "*";

/// Build phases a requirement asks the layer to be retained for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementFlags {
    /// Layer must be visible to later build steps
    pub build: bool,

    /// Layer must be present in the launch image
    pub launch: bool,
}

impl RequirementFlags {
    /// Flags for a build-only requirement
    pub fn build() -> Self {
        Self {
            build: true,
            launch: false,
        }
    }

    /// Flags for a launch-only requirement
    pub fn launch() -> Self {
        Self {
            build: false,
            launch: true,
        }
    }

    /// Whether the layer should be kept between builds
    pub fn cache(&self) -> bool {
        self.build || self.launch
    }
}

impl BitOr for RequirementFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            build: self.build || rhs.build,
            launch: self.launch || rhs.launch,
        }
    }
}

/// One request for a dependency version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEntry {
    /// Dependency identifier
    pub name: String,

    /// Requested version or wildcard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Where the request came from
    #[serde(
        default,
        rename = "version-source",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<String>,

    /// Requested build phases
    #[serde(flatten)]
    pub flags: RequirementFlags,
}

impl RequirementEntry {
    /// Create an entry that names only a dependency
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            source: None,
            flags: RequirementFlags::default(),
        }
    }

    /// Return a copy requesting `version`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Return a copy attributed to `source`
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Return a copy carrying `flags`
    pub fn with_flags(mut self, flags: RequirementFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Source label for display, `<unknown>` when absent
    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or(UNKNOWN_SOURCE)
    }

    /// Version for display, `*` when absent
    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or(ANY_VERSION)
    }
}

impl fmt::Display for RequirementEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.name,
            self.version_label(),
            self.source_label()
        )
    }
}
