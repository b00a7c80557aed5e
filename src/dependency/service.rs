//! Dependency resolution and delivery
//!
//! [`DependencyManager`] is the seam between the build orchestrator and the
//! outside world. [`CatalogService`] is the production implementation: it
//! reads `buildpack.toml`, fetches artifacts, verifies their SHA-256 and
//! unpacks them into the layer.

use super::bom::{generate_manifest, ManifestEntry};
use super::catalog::{Catalog, ResolvedDependency};
use super::mapping::find_mapping;
use crate::error::{FrameworkError, FrameworkResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolves catalog entries and installs them into layers
#[async_trait]
pub trait DependencyManager: Send + Sync {
    /// Pick the dependency satisfying `version` from the catalog at `catalog_path`
    async fn resolve(
        &self,
        catalog_path: &Path,
        id: &str,
        version: Option<&str>,
        stack: &str,
    ) -> FrameworkResult<ResolvedDependency>;

    /// Install `dependency` into `layer_path`
    async fn deliver(
        &self,
        dependency: &ResolvedDependency,
        cnb_path: &Path,
        layer_path: &Path,
        platform_path: Option<&Path>,
    ) -> FrameworkResult<()>;

    /// Bill-of-materials entries for `dependencies`
    fn generate_manifest_entries(&self, dependencies: &[ResolvedDependency]) -> Vec<ManifestEntry> {
        dependencies.iter().map(generate_manifest).collect()
    }
}

/// Catalog-backed dependency manager
#[derive(Debug, Clone, Default)]
pub struct CatalogService;

impl CatalogService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DependencyManager for CatalogService {
    async fn resolve(
        &self,
        catalog_path: &Path,
        id: &str,
        version: Option<&str>,
        stack: &str,
    ) -> FrameworkResult<ResolvedDependency> {
        Catalog::load(catalog_path).await?.resolve(id, version, stack)
    }

    async fn deliver(
        &self,
        dependency: &ResolvedDependency,
        cnb_path: &Path,
        layer_path: &Path,
        platform_path: Option<&Path>,
    ) -> FrameworkResult<()> {
        let mapped = match platform_path {
            Some(platform) => find_mapping(platform, &dependency.sha256).await?,
            None => None,
        };
        let uri = mapped.unwrap_or_else(|| dependency.uri.clone());
        let expected = dependency.sha256.clone();
        let cnb_path = cnb_path.to_path_buf();
        let layer_path = layer_path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let bytes = fetch(&uri, &cnb_path)?;
            verify_checksum(&uri, &expected, &bytes)?;
            unpack(&bytes, &layer_path)
        })
        .await
        .map_err(|e| FrameworkError::Internal(format!("delivery task failed: {}", e)))?
    }
}

/// Where an artifact URI points
#[derive(Debug, PartialEq, Eq)]
enum ArtifactLocation {
    Remote(String),
    Local(PathBuf),
}

fn locate(uri: &str, cnb_path: &Path) -> ArtifactLocation {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return ArtifactLocation::Remote(uri.to_string());
    }
    let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
    if path.is_absolute() {
        ArtifactLocation::Local(path.to_path_buf())
    } else {
        ArtifactLocation::Local(cnb_path.join(path))
    }
}

fn fetch(uri: &str, cnb_path: &Path) -> FrameworkResult<Vec<u8>> {
    let download_error = |reason: String| FrameworkError::Download {
        uri: uri.to_string(),
        reason,
    };

    match locate(uri, cnb_path) {
        ArtifactLocation::Local(path) => {
            debug!("Reading dependency from {}", path.display());
            std::fs::read(&path).map_err(|e| download_error(e.to_string()))
        }
        ArtifactLocation::Remote(url) => {
            debug!("Downloading dependency from {}", url);
            let response = ureq::get(url.as_str())
                .call()
                .map_err(|e| download_error(e.to_string()))?;
            let mut bytes = Vec::new();
            response
                .into_body()
                .into_reader()
                .read_to_end(&mut bytes)
                .map_err(|e| download_error(e.to_string()))?;
            Ok(bytes)
        }
    }
}

/// Compare the SHA-256 of `bytes` against `expected`
pub fn verify_checksum(uri: &str, expected: &str, bytes: &[u8]) -> FrameworkResult<()> {
    if expected.is_empty() {
        warn!("No checksum recorded for {}, skipping verification", uri);
        return Ok(());
    }

    let actual = hex::encode(Sha256::digest(bytes));
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(FrameworkError::ChecksumMismatch {
            uri: uri.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x1f, 0x8b])
}

/// Unpack a tar or gzip-compressed tar archive into `target`
fn unpack(bytes: &[u8], target: &Path) -> FrameworkResult<()> {
    let unpack_error = |source| FrameworkError::Unpack {
        path: target.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(target).map_err(unpack_error)?;

    if is_gzip(bytes) {
        let decoder = flate2::read::GzDecoder::new(Cursor::new(bytes));
        tar::Archive::new(decoder).unpack(target).map_err(unpack_error)
    } else {
        tar::Archive::new(Cursor::new(bytes))
            .unpack(target)
            .map_err(unpack_error)
    }
}
