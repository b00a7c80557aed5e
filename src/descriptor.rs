//! Runtime descriptor parsing
//!
//! Reads the application's `*.runtimeconfig.json` and recovers the .NET
//! runtime and ASP.NET Core framework constraints it declares. The file
//! is JSON but tolerates `//` and `/* */` comments, so those are stripped
//! before decoding.

use crate::error::{FrameworkError, FrameworkResult};
use crate::plan::entry::{RequirementEntry, ANY_VERSION};
use crate::plan::priority::{RUNTIMECONFIG_ASPNET_SOURCE, RUNTIMECONFIG_RUNTIME_SOURCE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Glob matched against the working directory
pub const DESCRIPTOR_GLOB: &str = "*.runtimeconfig.json";

/// Framework name of the .NET runtime
pub const NETCORE_FRAMEWORK: &str = "Microsoft.NETCore.App";

/// Framework name of ASP.NET Core
pub const ASPNETCORE_FRAMEWORK: &str = "Microsoft.AspNetCore.App";

/// Version constraints declared by a runtime descriptor.
///
/// Empty strings mean the descriptor did not mention that framework.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeVersions {
    /// `Microsoft.NETCore.App` constraint
    pub runtime: String,

    /// `Microsoft.AspNetCore.App` constraint
    pub aspnet: String,
}

impl RuntimeVersions {
    /// Requirement entries for every declared constraint, ASP.NET first
    pub fn entries(&self, name: &str) -> Vec<RequirementEntry> {
        let mut entries = Vec::new();
        if !self.aspnet.is_empty() {
            entries.push(
                RequirementEntry::new(name)
                    .with_version(self.aspnet.clone())
                    .with_source(RUNTIMECONFIG_ASPNET_SOURCE),
            );
        }
        if !self.runtime.is_empty() {
            entries.push(
                RequirementEntry::new(name)
                    .with_version(self.runtime.clone())
                    .with_source(RUNTIMECONFIG_RUNTIME_SOURCE),
            );
        }
        entries
    }
}

#[derive(Debug, Default, Deserialize)]
struct Descriptor {
    #[serde(default, rename = "runtimeOptions")]
    runtime_options: RuntimeOptions,
}

#[derive(Debug, Default, Deserialize)]
struct RuntimeOptions {
    #[serde(default)]
    framework: Framework,

    #[serde(default)]
    frameworks: Vec<Framework>,
}

#[derive(Debug, Default, Deserialize)]
struct Framework {
    #[serde(default)]
    name: String,

    #[serde(default)]
    version: String,
}

/// Find the single descriptor in `working_dir` and parse it.
pub async fn parse_descriptor(working_dir: &Path) -> FrameworkResult<RuntimeVersions> {
    let path = find_descriptor(working_dir)?;
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| FrameworkError::io(format!("reading {}", path.display()), e))?;

    let versions = parse_content(&path, &content)?;
    debug!(
        "{} declares runtime={:?} aspnet={:?}",
        path.display(),
        versions.runtime,
        versions.aspnet
    );
    Ok(versions)
}

/// Locate exactly one `*.runtimeconfig.json` in `working_dir`.
fn find_descriptor(working_dir: &Path) -> FrameworkResult<PathBuf> {
    let pattern = working_dir.join(DESCRIPTOR_GLOB);
    let pattern = pattern.to_string_lossy().into_owned();

    let paths = glob::glob(&pattern).map_err(|e| FrameworkError::DescriptorPattern {
        pattern: pattern.clone(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for path in paths {
        let path = path.map_err(|e| FrameworkError::io(format!("matching {}", pattern), e.into_error()))?;
        files.push(path);
    }
    files.sort();

    match files.len() {
        0 => Err(FrameworkError::DescriptorNotFound(pattern)),
        1 => Ok(files.remove(0)),
        _ => Err(FrameworkError::DescriptorAmbiguous { files }),
    }
}

fn parse_content(path: &Path, content: &str) -> FrameworkResult<RuntimeVersions> {
    let stripped = strip_comments(content);
    let descriptor: Descriptor =
        serde_json::from_str(&stripped).map_err(|source| FrameworkError::DescriptorParse {
            path: path.to_path_buf(),
            source,
        })?;

    let options = descriptor.runtime_options;
    let mut versions = RuntimeVersions::default();

    match options.framework.name.as_str() {
        NETCORE_FRAMEWORK => versions.runtime = version_or_wildcard(&options.framework.version),
        ASPNETCORE_FRAMEWORK => {
            // An ASP.NET Core app implies a runtime of the same version
            versions.aspnet = version_or_wildcard(&options.framework.version);
            versions.runtime = versions.aspnet.clone();
        }
        _ => {}
    }

    for framework in &options.frameworks {
        let slot = match framework.name.as_str() {
            NETCORE_FRAMEWORK => &mut versions.runtime,
            ASPNETCORE_FRAMEWORK => &mut versions.aspnet,
            _ => continue,
        };
        if !slot.is_empty() {
            return Err(FrameworkError::DescriptorDuplicateFramework {
                framework: framework.name.clone(),
            });
        }
        *slot = version_or_wildcard(&framework.version);
    }

    Ok(versions)
}

fn version_or_wildcard(version: &str) -> String {
    if version.is_empty() {
        ANY_VERSION.to_string()
    } else {
        version.to_string()
    }
}

/// Remove `//` line comments and `/* */` block comments outside of string
/// literals. Newlines inside comments are kept so error positions still
/// line up with the original file.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    prev = skipped;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}
