//! Detection: what this buildpack provides and requires

use crate::build::DEPENDENCY_ID;
use crate::error::FrameworkResult;
use crate::plan::priority::BUILDPACK_YML_SOURCE;
use crate::plan::sources::parse_buildpack_yml;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provision {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub metadata: RequirementMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementMetadata {
    pub version: String,
    #[serde(rename = "version-source")]
    pub version_source: String,
}

/// Build plan emitted by detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub provides: Vec<Provision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Requirement>,
}

/// Always provide the framework; require it when `buildpack.yml` pins a version
pub async fn detect(working_dir: &Path) -> FrameworkResult<BuildPlan> {
    let requires = parse_buildpack_yml(working_dir)
        .await?
        .map(|version| Requirement {
            name: DEPENDENCY_ID.to_string(),
            metadata: RequirementMetadata {
                version,
                version_source: BUILDPACK_YML_SOURCE.to_string(),
            },
        })
        .into_iter()
        .collect();

    Ok(BuildPlan {
        provides: vec![Provision {
            name: DEPENDENCY_ID.to_string(),
        }],
        requires,
    })
}
