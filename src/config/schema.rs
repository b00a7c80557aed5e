//! Configuration schema for aspnet-layer
//!
//! Configuration is stored at `~/.config/aspnet-layer/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Build defaults
    pub build: BuildConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Defaults for the `build` command, overridden by flags and environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory layers are written to
    pub layers_dir: Option<PathBuf>,

    /// Buildpack directory holding `buildpack.toml`
    pub cnb_dir: Option<PathBuf>,

    /// Platform directory with bindings
    pub platform_dir: Option<PathBuf>,

    /// Stack id used to filter catalog entries
    pub stack: String,

    /// Name shown in the build title when `buildpack.toml` has none
    pub buildpack_name: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            layers_dir: None,
            cnb_dir: None,
            platform_dir: None,
            stack: "io.buildpacks.stacks.jammy".to_string(),
            buildpack_name: "Dotnet Core ASPNet".to_string(),
        }
    }
}
