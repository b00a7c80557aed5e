//! Bill-of-materials entries for installed dependencies

use super::catalog::ResolvedDependency;
use serde::{Deserialize, Serialize};

/// Checksum algorithm recorded for every artifact
pub const CHECKSUM_ALGORITHM: &str = "SHA-256";

/// One bill-of-materials entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub metadata: ManifestMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManifestMetadata {
    pub version: String,
    pub uri: String,
    pub checksum: Checksum,
    pub stacks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ManifestSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub algorithm: String,
    pub hash: String,
}

impl Checksum {
    fn sha256(hash: &str) -> Self {
        Self {
            algorithm: CHECKSUM_ALGORITHM.to_string(),
            hash: hash.to_string(),
        }
    }
}

/// Upstream source archive the artifact was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSource {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<Checksum>,
}

/// Describe `dependency` as a bill-of-materials entry
pub fn generate_manifest(dependency: &ResolvedDependency) -> ManifestEntry {
    let source = dependency.source.as_ref().map(|uri| ManifestSource {
        uri: uri.clone(),
        checksum: dependency.source_sha256.as_deref().map(Checksum::sha256),
    });

    ManifestEntry {
        name: dependency.name.clone(),
        metadata: ManifestMetadata {
            version: dependency.version.clone(),
            uri: dependency.uri.clone(),
            checksum: Checksum::sha256(&dependency.sha256),
            stacks: dependency.stacks.clone(),
            licenses: dependency.licenses.clone(),
            purl: dependency.purl.clone(),
            cpe: dependency.cpe.clone(),
            deprecation_date: dependency
                .deprecation_date
                .map(|d| d.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn dependency() -> ResolvedDependency {
        ResolvedDependency {
            id: "dotnet-aspnetcore".to_string(),
            name: "ASP.NET Core".to_string(),
            version: "6.0.5".to_string(),
            sha256: "abc123".to_string(),
            stacks: vec!["io.buildpacks.stacks.bionic".to_string()],
            uri: "https://example.com/aspnetcore.tar.gz".to_string(),
            source: Some("https://example.com/aspnetcore-src.tar.gz".to_string()),
            source_sha256: Some("def456".to_string()),
            deprecation_date: Some(Utc.with_ymd_and_hms(2024, 11, 12, 0, 0, 0).unwrap()),
            licenses: vec!["MIT".to_string()],
            purl: Some("pkg:generic/aspnetcore@6.0.5".to_string()),
            cpe: None,
        }
    }

    #[test]
    fn manifest_carries_dependency_fields() {
        let entry = generate_manifest(&dependency());

        assert_eq!(entry.name, "ASP.NET Core");
        assert_eq!(entry.metadata.version, "6.0.5");
        assert_eq!(entry.metadata.checksum.algorithm, "SHA-256");
        assert_eq!(entry.metadata.checksum.hash, "abc123");
        assert_eq!(entry.metadata.deprecation_date.as_deref(), Some("2024-11-12T00:00:00Z"));

        let source = entry.metadata.source.unwrap();
        assert_eq!(source.checksum.unwrap().hash, "def456");
    }

    #[test]
    fn manifest_is_deterministic() {
        assert_eq!(generate_manifest(&dependency()), generate_manifest(&dependency()));
    }

    #[test]
    fn manifest_serializes_to_toml() {
        let mut dep = dependency();
        dep.source = None;
        dep.purl = None;

        let text = toml::to_string(&generate_manifest(&dep)).unwrap();
        assert!(text.contains("name = \"ASP.NET Core\""));
        assert!(text.contains("deprecation-date = \"2024-11-12T00:00:00Z\""));
        assert!(!text.contains("purl"));
    }
}
