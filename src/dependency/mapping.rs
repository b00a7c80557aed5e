//! Platform dependency-mapping bindings
//!
//! A binding lives at `<platform>/bindings/<name>/` and contains a `type`
//! file. When the type is `dependency-mapping`, every other file in the
//! binding is named after a dependency sha256 and holds a replacement URI.

use crate::error::{FrameworkError, FrameworkResult};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Binding type that remaps dependency URIs
pub const DEPENDENCY_MAPPING_TYPE: &str = "dependency-mapping";

/// Find a URI override for `sha256` in the platform bindings
pub async fn find_mapping(platform_path: &Path, sha256: &str) -> FrameworkResult<Option<String>> {
    let bindings_dir = platform_path.join("bindings");
    if sha256.is_empty() || !bindings_dir.is_dir() {
        return Ok(None);
    }

    let mut bindings = fs::read_dir(&bindings_dir)
        .await
        .map_err(|e| FrameworkError::io("reading platform bindings", e))?;

    while let Some(binding) = bindings
        .next_entry()
        .await
        .map_err(|e| FrameworkError::io("reading platform binding entry", e))?
    {
        let path = binding.path();
        let Ok(kind) = fs::read_to_string(path.join("type")).await else {
            continue;
        };
        if kind.trim() != DEPENDENCY_MAPPING_TYPE {
            continue;
        }

        let candidate = path.join(sha256);
        if candidate.is_file() {
            let uri = fs::read_to_string(&candidate)
                .await
                .map_err(|e| FrameworkError::io(format!("reading binding {}", candidate.display()), e))?;
            let uri = uri.trim().to_string();
            debug!("Dependency {} remapped to {} by {}", sha256, uri, path.display());
            return Ok(Some(uri));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn binding(platform: &Path, name: &str, kind: &str, files: &[(&str, &str)]) {
        let dir = platform.join("bindings").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("type"), kind).unwrap();
        for (file, content) in files {
            std::fs::write(dir.join(file), content).unwrap();
        }
    }

    #[tokio::test]
    async fn finds_mapped_uri() {
        let temp = TempDir::new().unwrap();
        binding(temp.path(), "other", "ca-certificates", &[("abc", "ignored")]);
        binding(
            temp.path(),
            "mirror",
            "dependency-mapping\n",
            &[("abc", "file:///mirror/aspnet.tgz\n")],
        );

        let uri = find_mapping(temp.path(), "abc").await.unwrap();
        assert_eq!(uri.as_deref(), Some("file:///mirror/aspnet.tgz"));
    }

    #[tokio::test]
    async fn no_bindings_means_no_mapping() {
        let temp = TempDir::new().unwrap();
        assert!(find_mapping(temp.path(), "abc").await.unwrap().is_none());

        binding(temp.path(), "mirror", "dependency-mapping", &[("def", "file:///x")]);
        assert!(find_mapping(temp.path(), "abc").await.unwrap().is_none());
    }
}
