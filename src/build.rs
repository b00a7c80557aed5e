//! Build orchestration
//!
//! One build runs these steps in order:
//! 1. Read the runtime descriptor and add its entries to the caller's entries
//! 2. Rank the entries and pick a winner
//! 3. Resolve the winner against the dependency catalog
//! 4. Reuse the layer when its recorded dependency sha matches, otherwise
//!    reset it and install the dependency
//! 5. Link the layer into the working directory

use crate::dependency::{BuildpackInfo, DependencyManager, ManifestEntry, ResolvedDependency};
use crate::descriptor::parse_descriptor;
use crate::error::FrameworkResult;
use crate::layer::{DotnetRootLinker, EnvironmentLinker, Layer, LayerStore};
use crate::plan::priority::{BUILDPACK_YML_SOURCE, EXECUTE_BUILDPACK_SOURCE};
use crate::plan::{merge_layer_types, resolve, PriorityList, RequirementEntry, RequirementFlags};
use crate::report::{candidate_lines, environment_lines, selection};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Dependency id in the catalog and the build plan
pub const DEPENDENCY_ID: &str = "dotnet-aspnetcore";

/// Name of the layer the framework is installed into
pub const LAYER_NAME: &str = "dotnet-core-aspnet";

/// Catalog file inside the buildpack directory
pub const CATALOG_FILE: &str = "buildpack.toml";

/// Environment variable pointing at the mirrored dotnet root
pub const DOTNET_ROOT_ENV: &str = "DOTNET_ROOT";

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything one build needs to know about its surroundings
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Application directory
    pub working_dir: PathBuf,

    /// Buildpack directory holding `buildpack.toml`
    pub cnb_path: PathBuf,

    pub layers_dir: PathBuf,

    /// Platform directory with optional bindings
    pub platform_path: Option<PathBuf>,

    pub stack: String,

    pub buildpack: BuildpackInfo,

    /// Entries contributed by the build plan, environment and `buildpack.yml`
    pub entries: Vec<RequirementEntry>,
}

/// Whether the layer was reused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

/// Result of a build
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub layers: Vec<Layer>,
    pub dependency: Option<ResolvedDependency>,
    /// Bill of materials for the resolved dependency
    pub manifest: Vec<ManifestEntry>,
    /// Bill of materials when the layer is needed at build time
    pub build_bom: Vec<ManifestEntry>,
    /// Bill of materials when the layer is needed at launch
    pub launch_bom: Vec<ManifestEntry>,
    /// `None` when installation was skipped
    pub cache: Option<CacheStatus>,
}

impl BuildOutcome {
    /// Nothing was installed
    pub fn is_skipped(&self) -> bool {
        self.cache.is_none()
    }
}

/// Drives a build against injected collaborators
pub struct BuildOrchestrator {
    dependencies: Arc<dyn DependencyManager>,
    linker: Arc<dyn EnvironmentLinker>,
    clock: Arc<dyn Clock>,
}

impl BuildOrchestrator {
    pub fn new(
        dependencies: Arc<dyn DependencyManager>,
        linker: Arc<dyn EnvironmentLinker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            dependencies,
            linker,
            clock,
        }
    }

    /// Run one build
    pub async fn build(&self, ctx: &BuildContext) -> FrameworkResult<BuildOutcome> {
        info!("{} {}", ctx.buildpack.name, ctx.buildpack.version);
        info!("Resolving Dotnet Core ASPNet version");

        let mut entries = ctx.entries.clone();
        match parse_descriptor(&ctx.working_dir).await {
            Ok(versions) => entries.extend(versions.entries(DEPENDENCY_ID)),
            Err(e) if e.is_not_found() => debug!("No runtime descriptor: {}", e),
            Err(e) => return Err(e),
        }

        let priorities = PriorityList::aspnet()?;
        let resolution = resolve(DEPENDENCY_ID, &entries, &priorities);
        for line in candidate_lines(&resolution.sorted) {
            info!("{}", line);
        }

        let Some(winner) = resolution.winner else {
            info!("No version of ASP.NET requested. Skipping install.");
            return Ok(BuildOutcome::default());
        };

        match winner.source.as_deref() {
            Some(BUILDPACK_YML_SOURCE) => warn_buildpack_yml(&ctx.buildpack),
            Some(EXECUTE_BUILDPACK_SOURCE) => {
                info!("No version of ASP.NET requested. Skipping install.");
                return Ok(BuildOutcome::default());
            }
            _ => {}
        }

        let catalog = ctx.cnb_path.join(CATALOG_FILE);
        let dependency = self
            .dependencies
            .resolve(&catalog, DEPENDENCY_ID, winner.version.as_deref(), &ctx.stack)
            .await?;

        let selected = selection(&winner, &dependency, self.clock.now());
        info!("{}", selected.line);
        for line in &selected.warnings {
            warn!("{}", line);
        }

        let store = LayerStore::new(&ctx.layers_dir);
        let layer = store.get(LAYER_NAME).await?;

        let manifest = self
            .dependencies
            .generate_manifest_entries(std::slice::from_ref(&dependency));
        let flags = merge_layer_types(DEPENDENCY_ID, &entries);

        let mut outcome = BuildOutcome {
            build_bom: if flags.build { manifest.clone() } else { Vec::new() },
            launch_bom: if flags.launch { manifest.clone() } else { Vec::new() },
            manifest,
            ..Default::default()
        };

        // An empty sha never identifies an install
        let cached = !dependency.sha256.is_empty()
            && layer.metadata.dependency_sha.as_deref() == Some(dependency.sha256.as_str());
        let layer = if cached {
            self.reuse(ctx, &store, layer, flags).await?
        } else {
            self.install(ctx, &store, layer, flags, &dependency).await?
        };

        outcome.cache = Some(if cached { CacheStatus::Hit } else { CacheStatus::Miss });
        outcome.dependency = Some(dependency);
        outcome.layers.push(layer);
        Ok(outcome)
    }

    async fn reuse(
        &self,
        ctx: &BuildContext,
        store: &LayerStore,
        mut layer: Layer,
        flags: RequirementFlags,
    ) -> FrameworkResult<Layer> {
        info!("Reusing cached layer {}", layer.path.display());

        self.linker.link(&ctx.working_dir, &layer.path).await?;

        apply_flags(&mut layer, flags);
        store.persist(&layer).await?;
        Ok(layer)
    }

    async fn install(
        &self,
        ctx: &BuildContext,
        store: &LayerStore,
        layer: Layer,
        flags: RequirementFlags,
        dependency: &ResolvedDependency,
    ) -> FrameworkResult<Layer> {
        info!("Executing build process");

        let mut layer = store.reset(&layer).await?;
        apply_flags(&mut layer, flags);

        info!("Installing Dotnet Core ASPNet {}", dependency.version);
        let started = Instant::now();
        self.dependencies
            .deliver(
                dependency,
                &ctx.cnb_path,
                &layer.path,
                ctx.platform_path.as_deref(),
            )
            .await?;
        info!("Completed in {}ms", started.elapsed().as_millis());

        layer.metadata.dependency_sha = Some(dependency.sha256.clone());
        layer.metadata.built_at = Some(self.clock.now().to_rfc3339());

        let dotnet_root = DotnetRootLinker::dotnet_root(&ctx.working_dir);
        layer.override_env(DOTNET_ROOT_ENV, dotnet_root.display().to_string());
        for line in environment_lines(&layer.shared_env) {
            info!("{}", line);
        }

        // Persist first so a failed link still leaves a reusable layer
        store.persist(&layer).await?;
        self.linker.link(&ctx.working_dir, &layer.path).await?;
        Ok(layer)
    }
}

fn apply_flags(layer: &mut Layer, flags: RequirementFlags) {
    layer.build = flags.build;
    layer.launch = flags.launch;
    layer.cache = flags.cache();
}

fn warn_buildpack_yml(buildpack: &BuildpackInfo) {
    let next_major = semver::Version::parse(&buildpack.version)
        .map(|v| format!(" v{}.0.0", v.major + 1))
        .unwrap_or_default();
    warn!(
        "WARNING: Setting the .NET Framework version through buildpack.yml will be deprecated soon in {} Buildpack{}.",
        buildpack.name, next_major
    );
    warn!(
        "Please specify the version through the $BP_DOTNET_FRAMEWORK_VERSION environment variable instead. See docs for more information."
    );
}
