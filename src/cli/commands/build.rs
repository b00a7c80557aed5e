//! Build command - resolve, install or reuse the framework layer

use crate::build::{
    BuildContext, BuildOrchestrator, BuildOutcome, CacheStatus, SystemClock, CATALOG_FILE,
    DEPENDENCY_ID,
};
use crate::cli::args::{BuildArgs, OutputFormat};
use crate::config::Config;
use crate::dependency::{BuildpackInfo, Catalog, CatalogService, ManifestEntry};
use crate::error::{FrameworkError, FrameworkResult};
use crate::layer::DotnetRootLinker;
use crate::plan::sources::{buildpack_yml_entries, load_plan};
use crate::plan::BuildEnvironment;
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Bill-of-materials file written next to the layers
#[derive(Serialize)]
struct BomFile<'a> {
    bom: &'a [ManifestEntry],
}

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> FrameworkResult<()> {
    let cwd = std::env::current_dir()
        .map_err(|e| FrameworkError::io("getting current directory", e))?;

    let working_dir = args.working_dir.unwrap_or_else(|| cwd.clone());
    let layers_dir = args
        .layers
        .or_else(|| config.build.layers_dir.clone())
        .unwrap_or_else(|| cwd.join("layers"));
    let cnb_path = args
        .cnb
        .or_else(|| config.build.cnb_dir.clone())
        .unwrap_or_else(|| cwd.clone());
    let platform_path = args.platform.or_else(|| config.build.platform_dir.clone());
    let stack = args.stack.unwrap_or_else(|| config.build.stack.clone());

    let buildpack = buildpack_info(&cnb_path.join(CATALOG_FILE), config).await?;

    let mut entries = match &args.plan {
        Some(path) => load_plan(path).await?,
        None => Vec::new(),
    };
    entries.extend(BuildEnvironment::from_process().entries(DEPENDENCY_ID));
    entries.extend(buildpack_yml_entries(&working_dir, DEPENDENCY_ID).await?);
    debug!("Collected {} requirement entries", entries.len());

    let ctx = BuildContext {
        working_dir,
        cnb_path,
        layers_dir,
        platform_path,
        stack,
        buildpack,
        entries,
    };

    let orchestrator = BuildOrchestrator::new(
        Arc::new(CatalogService::new()),
        Arc::new(DotnetRootLinker::new()),
        Arc::new(SystemClock),
    );
    let outcome = orchestrator.build(&ctx).await?;

    write_bom(&ctx.layers_dir.join("build.toml"), &outcome.build_bom).await?;
    write_bom(&ctx.layers_dir.join("launch.toml"), &outcome.launch_bom).await?;

    match args.format {
        OutputFormat::Table => print_summary(&outcome),
        OutputFormat::Json => print_json(&outcome)?,
    }

    Ok(())
}

/// Buildpack identity for log lines; a missing catalog only fails once a
/// dependency has to be resolved from it
async fn buildpack_info(catalog_path: &Path, config: &Config) -> FrameworkResult<BuildpackInfo> {
    let mut buildpack = if catalog_path.is_file() {
        Catalog::load(catalog_path).await?.buildpack().clone()
    } else {
        debug!("No catalog at {}", catalog_path.display());
        BuildpackInfo::default()
    };
    if buildpack.name.is_empty() {
        buildpack.name = config.build.buildpack_name.clone();
    }
    Ok(buildpack)
}

async fn write_bom(path: &Path, entries: &[ManifestEntry]) -> FrameworkResult<()> {
    if entries.is_empty() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FrameworkError::io(format!("creating {}", parent.display()), e))?;
    }

    let content = toml::to_string_pretty(&BomFile { bom: entries })?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| FrameworkError::io(format!("writing {}", path.display()), e))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn print_summary(outcome: &BuildOutcome) {
    println!();
    let (Some(dependency), Some(layer)) = (&outcome.dependency, outcome.layers.first()) else {
        println!("{}", style("Skipped: no ASP.NET Core version requested").dim());
        return;
    };

    let status = match outcome.cache {
        Some(CacheStatus::Hit) => style("reused").green(),
        _ => style("installed").cyan(),
    };

    println!(
        "{} {} {}",
        style(&dependency.name).bold(),
        dependency.version,
        status
    );
    println!("  {:<8} {}", style("layer").dim(), layer.path.display());
    println!("  {:<8} {}", style("sha256").dim(), dependency.sha256);
    println!(
        "  {:<8} build={} launch={} cache={}",
        style("flags").dim(),
        layer.build,
        layer.launch,
        layer.cache
    );
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    skipped: bool,
    cache: Option<&'static str>,
    dependency: Option<&'a str>,
    version: Option<&'a str>,
    sha256: Option<&'a str>,
    layer: Option<PathBuf>,
    build: bool,
    launch: bool,
}

fn print_json(outcome: &BuildOutcome) -> FrameworkResult<()> {
    let layer = outcome.layers.first();
    let summary = JsonSummary {
        skipped: outcome.is_skipped(),
        cache: outcome.cache.map(|status| match status {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }),
        dependency: outcome.dependency.as_ref().map(|d| d.id.as_str()),
        version: outcome.dependency.as_ref().map(|d| d.version.as_str()),
        sha256: outcome.dependency.as_ref().map(|d| d.sha256.as_str()),
        layer: layer.map(|l| l.path.clone()),
        build: layer.is_some_and(|l| l.build),
        launch: layer.is_some_and(|l| l.launch),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
