//! Layer state and environment linking
//!
//! A layer is a directory the framework is installed into, plus a state file
//! recording which dependency it holds and which build phases need it.

pub mod linker;
pub mod store;

pub use linker::{DotnetRootLinker, EnvironmentLinker, DOTNET_ROOT_DIR};
pub use store::{Layer, LayerMetadata, LayerStore};
