//! aspnet-layer - ASP.NET Core framework layer builder
//!
//! CLI entry point that dispatches to subcommands.

use aspnet_layer::cli::{Cli, Commands};
use aspnet_layer::config::ConfigManager;
use aspnet_layer::error::FrameworkResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> FrameworkResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Initialize logging: 0 = info (build steps), 1+ = debug
    let filter = if cli.verbose > 0 || config.general.verbose {
        EnvFilter::new("aspnet_layer=debug")
    } else {
        EnvFilter::new("aspnet_layer=info")
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .init();
    }

    match cli.command {
        Commands::Detect(args) => aspnet_layer::cli::commands::detect(args, &config).await,
        Commands::Build(args) => aspnet_layer::cli::commands::build(args, &config).await,
    }
}
