//! Error types for aspnet-layer
//!
//! All modules use `FrameworkResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for aspnet-layer operations
pub type FrameworkResult<T> = Result<T, FrameworkError>;

/// All errors that can occur while resolving, installing or caching the framework
#[derive(Error, Debug)]
pub enum FrameworkError {
    // Descriptor errors
    #[error("no *.runtimeconfig.json found matching {0}")]
    DescriptorNotFound(String),

    #[error("multiple *.runtimeconfig.json files present: {files:?}")]
    DescriptorAmbiguous { files: Vec<PathBuf> },

    #[error("malformed runtimeconfig.json: multiple '{framework}' frameworks specified")]
    DescriptorDuplicateFramework { framework: String },

    #[error("failed to parse {path}: {source}")]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid descriptor pattern {pattern}: {reason}")]
    DescriptorPattern { pattern: String, reason: String },

    // Requirement source errors
    #[error("failed to parse {path}: {reason}")]
    BuildpackYaml { path: PathBuf, reason: String },

    #[error("failed to parse build plan {path}: {reason}")]
    PlanInvalid { path: PathBuf, reason: String },

    #[error("invalid priority pattern '{pattern}': {source}")]
    PriorityPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    // Dependency errors
    #[error("failed to parse dependency catalog {path}: {reason}")]
    CatalogInvalid { path: PathBuf, reason: String },

    #[error(
        "failed to satisfy \"{id}\" dependency version constraint \"{constraint}\" on stack \"{stack}\": no compatible versions. Supported versions are: [{supported}]"
    )]
    DependencyNotFound {
        id: String,
        constraint: String,
        stack: String,
        supported: String,
    },

    #[error("invalid version constraint '{constraint}': {reason}")]
    VersionConstraint { constraint: String, reason: String },

    #[error("failed to fetch dependency from {uri}: {reason}")]
    Download { uri: String, reason: String },

    #[error("checksum does not match for {uri}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        uri: String,
        expected: String,
        actual: String,
    },

    #[error("failed to unpack dependency into {path}: {source}")]
    Unpack {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Layer errors
    #[error("failed to parse layer content metadata {path}: {reason}")]
    LayerMetadata { path: PathBuf, reason: String },

    #[error("could not remove file {path}: {source}")]
    LayerReset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to persist layer {name}: {reason}")]
    LayerPersist { name: String, reason: String },

    #[error("failed to link {target} into {link}: {source}")]
    Link {
        target: PathBuf,
        link: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FrameworkError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error only means "no descriptor was found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DescriptorNotFound(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DescriptorAmbiguous { .. } => {
                Some("Publish a single application so only one *.runtimeconfig.json remains")
            }
            Self::DescriptorDuplicateFramework { .. } => {
                Some("List each framework once in runtimeOptions.framework or runtimeOptions.frameworks")
            }
            Self::DependencyNotFound { .. } => {
                Some("Set BP_DOTNET_FRAMEWORK_VERSION to one of the supported versions")
            }
            Self::ChecksumMismatch { .. } => Some("The dependency catalog may be out of date"),
            _ => None,
        }
    }
}
