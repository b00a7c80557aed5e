//! Layer directories and their persisted state
//!
//! Each layer lives at `<layers>/<name>/` with its state in
//! `<layers>/<name>.toml`:
//!
//! ```toml
//! [types]
//! build = true
//! launch = true
//! cache = true
//!
//! [metadata]
//! dependency-sha = "..."
//! built_at = "2024-01-01T00:00:00Z"
//! ```
//!
//! Shared environment overrides are written to `<layers>/<name>/env/<VAR>.override`.

use crate::error::{FrameworkError, FrameworkResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const OVERRIDE_SUFFIX: &str = ".override";

/// Metadata recorded after a successful install
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// SHA-256 of the installed dependency, the cache key
    #[serde(
        default,
        rename = "dependency-sha",
        skip_serializing_if = "Option::is_none"
    )]
    pub dependency_sha: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct LayerTypes {
    #[serde(default)]
    build: bool,
    #[serde(default)]
    launch: bool,
    #[serde(default)]
    cache: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerFile {
    #[serde(default)]
    types: LayerTypes,
    #[serde(default)]
    metadata: LayerMetadata,
}

/// A named layer and its in-memory state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub path: PathBuf,
    pub build: bool,
    pub launch: bool,
    pub cache: bool,
    pub metadata: LayerMetadata,
    /// Environment variables exported to later buildpacks and the launch image
    pub shared_env: BTreeMap<String, String>,
}

impl Layer {
    /// Set an environment override
    pub fn override_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.shared_env.insert(name.into(), value.into());
    }
}

/// Reads, resets and persists layers under one layers directory
#[derive(Debug, Clone)]
pub struct LayerStore {
    layers_dir: PathBuf,
}

impl LayerStore {
    pub fn new(layers_dir: impl Into<PathBuf>) -> Self {
        Self {
            layers_dir: layers_dir.into(),
        }
    }

    pub fn layers_dir(&self) -> &Path {
        &self.layers_dir
    }

    fn state_path(&self, name: &str) -> PathBuf {
        self.layers_dir.join(format!("{}.toml", name))
    }

    /// Load a layer, creating its directory if needed
    pub async fn get(&self, name: &str) -> FrameworkResult<Layer> {
        let path = self.layers_dir.join(name);
        let state_path = self.state_path(name);

        let state = if state_path.is_file() {
            let content = fs::read_to_string(&state_path).await.map_err(|e| {
                FrameworkError::io(format!("reading layer state {}", state_path.display()), e)
            })?;
            toml::from_str::<LayerFile>(&content).map_err(|e| FrameworkError::LayerMetadata {
                path: state_path.clone(),
                reason: e.to_string(),
            })?
        } else {
            LayerFile::default()
        };

        fs::create_dir_all(&path)
            .await
            .map_err(|e| FrameworkError::io(format!("creating layer {}", path.display()), e))?;

        let shared_env = read_env_overrides(&path.join("env")).await?;

        debug!(
            "Loaded layer {} (dependency-sha: {:?})",
            name, state.metadata.dependency_sha
        );

        Ok(Layer {
            name: name.to_string(),
            path,
            build: state.types.build,
            launch: state.types.launch,
            cache: state.types.cache,
            metadata: state.metadata,
            shared_env,
        })
    }

    /// Clear a layer's contents, flags and metadata
    pub async fn reset(&self, layer: &Layer) -> FrameworkResult<Layer> {
        if layer.path.exists() {
            fs::remove_dir_all(&layer.path)
                .await
                .map_err(|e| FrameworkError::LayerReset {
                    path: layer.path.clone(),
                    source: e,
                })?;
        }
        fs::create_dir_all(&layer.path)
            .await
            .map_err(|e| FrameworkError::LayerReset {
                path: layer.path.clone(),
                source: e,
            })?;

        debug!("Reset layer {}", layer.name);

        Ok(Layer {
            name: layer.name.clone(),
            path: layer.path.clone(),
            build: false,
            launch: false,
            cache: false,
            metadata: LayerMetadata::default(),
            shared_env: BTreeMap::new(),
        })
    }

    /// Write a layer's state file and environment overrides
    pub async fn persist(&self, layer: &Layer) -> FrameworkResult<()> {
        let persist_error = |reason: String| FrameworkError::LayerPersist {
            name: layer.name.clone(),
            reason,
        };

        let file = LayerFile {
            types: LayerTypes {
                build: layer.build,
                launch: layer.launch,
                cache: layer.cache,
            },
            metadata: layer.metadata.clone(),
        };
        let content = toml::to_string_pretty(&file)?;

        fs::create_dir_all(&self.layers_dir)
            .await
            .map_err(|e| persist_error(e.to_string()))?;
        fs::write(self.state_path(&layer.name), content)
            .await
            .map_err(|e| persist_error(e.to_string()))?;

        if !layer.shared_env.is_empty() {
            let env_dir = layer.path.join("env");
            fs::create_dir_all(&env_dir)
                .await
                .map_err(|e| persist_error(e.to_string()))?;
            for (name, value) in &layer.shared_env {
                fs::write(env_dir.join(format!("{}{}", name, OVERRIDE_SUFFIX)), value)
                    .await
                    .map_err(|e| persist_error(e.to_string()))?;
            }
        }

        debug!("Persisted layer {}", layer.name);
        Ok(())
    }
}

async fn read_env_overrides(env_dir: &Path) -> FrameworkResult<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    if !env_dir.is_dir() {
        return Ok(env);
    }

    let mut entries = fs::read_dir(env_dir)
        .await
        .map_err(|e| FrameworkError::io("reading layer env directory", e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| FrameworkError::io("reading layer env entry", e))?
    {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str().and_then(|n| n.strip_suffix(OVERRIDE_SUFFIX)) else {
            continue;
        };
        let path = entry.path();
        let value = fs::read_to_string(&path)
            .await
            .map_err(|e| FrameworkError::io(format!("reading {}", path.display()), e))?;
        env.insert(name.to_string(), value);
    }

    Ok(env)
}
