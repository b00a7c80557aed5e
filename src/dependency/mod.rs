//! Framework dependency catalog, delivery and bill of materials

pub mod bom;
pub mod catalog;
pub mod mapping;
pub mod service;

pub use bom::{generate_manifest, ManifestEntry};
pub use catalog::{BuildpackInfo, Catalog, ResolvedDependency, VersionConstraint};
pub use service::{CatalogService, DependencyManager};
