//! Shared types for graft.
//!
//! The descriptor types are produced by providers and consumed by the
//! build pipeline in `graft-core`. The configuration types describe a
//! `graft.toml` file.

pub mod config;
pub mod types;

// Re-exports
pub use config::{
    BuildSettings, ConfigError, GraftConfig, TemplateSettings, ToolchainConfig, TreeLayout,
};
pub use types::*;

/// Exported type every plugin package must provide. Part of the contract
/// with plugin authors, so it is not configurable.
pub const PLUGIN_STRUCTURE: &str = "Plugin{}";
