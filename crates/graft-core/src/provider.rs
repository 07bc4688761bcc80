//! Sources of module descriptors.
//!
//! Fetching plugin metadata from source-hosting services happens outside
//! this crate. Providers hand the builder a ready list of descriptors; when
//! several are configured their lists are concatenated in order.

use anyhow::{Context, Result};
use graft_schema::ModuleDescriptor;
use serde::Deserialize;
use std::path::PathBuf;

/// Source of module descriptors.
pub trait ModuleProvider {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Produce this provider's descriptors, in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source cannot be read.
    fn modules(&self) -> Result<Vec<ModuleDescriptor>>;
}

/// Descriptors known up front, e.g. the `[[plugins]]` array of `graft.toml`.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    name: String,
    modules: Vec<ModuleDescriptor>,
}

impl StaticProvider {
    /// Wrap an existing list.
    pub fn new(name: impl Into<String>, modules: Vec<ModuleDescriptor>) -> Self {
        Self {
            name: name.into(),
            modules,
        }
    }
}

impl ModuleProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn modules(&self) -> Result<Vec<ModuleDescriptor>> {
        Ok(self.modules.clone())
    }
}

/// Reads a TOML file holding a `[[plugins]]` array.
///
/// ```toml
/// [[plugins]]
/// module_name = "github.com/roadrunner-server/logger/v4"
/// version = "v4.2.0"
/// ```
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

#[derive(Deserialize)]
struct PluginList {
    #[serde(default)]
    plugins: Vec<ModuleDescriptor>,
}

impl FileProvider {
    /// Provider backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ModuleProvider for FileProvider {
    fn name(&self) -> &str {
        "file"
    }

    fn modules(&self) -> Result<Vec<ModuleDescriptor>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let list: PluginList = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(list.plugins)
    }
}

/// Concatenate the descriptors of every provider, in provider order.
///
/// # Errors
///
/// Returns the first provider error, annotated with the provider's name.
pub fn collect_modules(providers: &[&dyn ModuleProvider]) -> Result<Vec<ModuleDescriptor>> {
    let mut all = Vec::new();
    for provider in providers {
        let modules = provider
            .modules()
            .with_context(|| format!("Provider '{}' failed", provider.name()))?;
        tracing::debug!(provider = provider.name(), count = modules.len(), "collected modules");
        all.extend(modules);
    }
    Ok(all)
}
