//! Detect command - print or write the build plan

use crate::cli::args::DetectArgs;
use crate::config::Config;
use crate::detect::detect;
use crate::error::{FrameworkError, FrameworkResult};
use tracing::debug;

/// Execute the detect command
pub async fn execute(args: DetectArgs, _config: &Config) -> FrameworkResult<()> {
    let working_dir = match args.working_dir {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| FrameworkError::io("getting current directory", e))?,
    };
    debug!("Detecting in {}", working_dir.display());

    let plan = detect(&working_dir).await?;
    let content = toml::to_string_pretty(&plan)?;

    match args.plan_output {
        Some(path) => tokio::fs::write(&path, content).await.map_err(|e| {
            FrameworkError::io(format!("writing build plan to {}", path.display()), e)
        })?,
        None => print!("{}", content),
    }

    Ok(())
}
