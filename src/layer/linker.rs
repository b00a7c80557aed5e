//! Exposing the installed framework to the application

use crate::error::{FrameworkError, FrameworkResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Directory inside the application that mirrors a dotnet root
pub const DOTNET_ROOT_DIR: &str = ".dotnet_root";

/// Shared framework directory name inside a dotnet root
pub const ASPNET_SHARED_FRAMEWORK: &str = "Microsoft.AspNetCore.App";

/// Makes an installed layer visible from the working directory
#[async_trait]
pub trait EnvironmentLinker: Send + Sync {
    async fn link(&self, working_dir: &Path, layer_path: &Path) -> FrameworkResult<()>;
}

/// Links `<layer>/shared/Microsoft.AspNetCore.App` into `<wd>/.dotnet_root/shared/`
#[derive(Debug, Clone, Default)]
pub struct DotnetRootLinker;

impl DotnetRootLinker {
    pub fn new() -> Self {
        Self
    }

    /// `<working_dir>/.dotnet_root`
    pub fn dotnet_root(working_dir: &Path) -> PathBuf {
        working_dir.join(DOTNET_ROOT_DIR)
    }
}

#[async_trait]
impl EnvironmentLinker for DotnetRootLinker {
    async fn link(&self, working_dir: &Path, layer_path: &Path) -> FrameworkResult<()> {
        let shared = Self::dotnet_root(working_dir).join("shared");
        let target = layer_path.join("shared").join(ASPNET_SHARED_FRAMEWORK);
        let link = shared.join(ASPNET_SHARED_FRAMEWORK);
        let link_error = |source| FrameworkError::Link {
            target: target.clone(),
            link: link.clone(),
            source,
        };

        fs::create_dir_all(&shared).await.map_err(link_error)?;

        // Replace a link left by a previous build
        if fs::symlink_metadata(&link).await.is_ok() {
            fs::remove_file(&link).await.map_err(link_error)?;
        }

        symlink(&target, &link).await.map_err(link_error)?;
        debug!("Linked {} -> {}", link.display(), target.display());
        Ok(())
    }
}

#[cfg(unix)]
async fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    fs::symlink(target, link).await
}

#[cfg(windows)]
async fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    fs::symlink_dir(target, link).await
}
