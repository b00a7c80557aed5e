//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// aspnet-layer - ASP.NET Core framework layer builder
///
/// Picks the ASP.NET Core shared framework version an application needs,
/// installs it into a layer and reuses that layer while nothing changes.
#[derive(Parser, Debug)]
#[command(name = "aspnet-layer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ASPNET_LAYER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report what the application provides and requires
    Detect(DetectArgs),

    /// Resolve, install or reuse the framework layer
    Build(BuildArgs),
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Application directory (defaults to current directory)
    #[arg(short, long)]
    pub working_dir: Option<PathBuf>,

    /// Write the build plan here instead of stdout
    #[arg(long)]
    pub plan_output: Option<PathBuf>,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Application directory (defaults to current directory)
    #[arg(short, long)]
    pub working_dir: Option<PathBuf>,

    /// Layers directory
    #[arg(long, env = "CNB_LAYERS_DIR")]
    pub layers: Option<PathBuf>,

    /// Buildpack directory containing buildpack.toml
    #[arg(long, env = "CNB_BUILDPACK_DIR")]
    pub cnb: Option<PathBuf>,

    /// Platform directory
    #[arg(long, env = "CNB_PLATFORM_DIR")]
    pub platform: Option<PathBuf>,

    /// Build plan with requirement entries
    #[arg(long, env = "CNB_BP_PLAN_PATH")]
    pub plan: Option<PathBuf>,

    /// Stack id
    #[arg(long, env = "CNB_STACK_ID")]
    pub stack: Option<String>,

    /// Output format for the build summary
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format options
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Table,
    /// JSON output
    Json,
}
