//! aspnet-layer - ASP.NET Core framework layer builder
//!
//! Reads version requests from the runtime descriptor, the environment,
//! `buildpack.yml` and the build plan, picks one ASP.NET Core framework
//! version, and installs it into a layer that is reused while the
//! resolved dependency stays the same.

pub mod build;
pub mod cli;
pub mod config;
pub mod dependency;
pub mod descriptor;
pub mod detect;
pub mod error;
pub mod layer;
pub mod plan;
pub mod report;

pub use error::{FrameworkError, FrameworkResult};
