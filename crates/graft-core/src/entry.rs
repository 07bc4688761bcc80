//! Rendering entries: descriptors plus a generated import alias.

use graft_schema::{ModuleDescriptor, ModuleName, PLUGIN_STRUCTURE};
use rand::Rng;

use crate::alias::AliasGenerator;

/// A [`ModuleDescriptor`] projected for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Import path, copied from the descriptor.
    pub module: ModuleName,
    /// Import alias, unique within the template.
    pub prefix: String,
    /// Exported type instantiated for registration.
    pub structure: &'static str,
    /// Version to fetch, if any.
    pub version: Option<String>,
    /// Local substitution path, if any.
    pub replace: Option<String>,
}

impl Entry {
    /// Whether the dependency resolution stage fetches this module.
    pub fn is_fetched(&self) -> bool {
        self.replace.is_none()
    }
}

/// Ordered entries for one build. Index `i` corresponds to input
/// descriptor `i`; duplicates in the input stay duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    entries: Vec<Entry>,
}

impl Template {
    /// Map every descriptor to an entry, drawing aliases from `aliases`.
    pub fn generate<R: Rng>(modules: &[ModuleDescriptor], aliases: &mut AliasGenerator<R>) -> Self {
        let entries = modules
            .iter()
            .map(|module| Entry {
                module: module.module_name.clone(),
                prefix: aliases.next_alias(),
                structure: PLUGIN_STRUCTURE,
                version: module.version().map(str::to_string),
                replace: module.replace().map(str::to_string),
            })
            .collect();

        Self { entries }
    }

    /// All entries, in input order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entries the resolve stage fetches, in input order.
    pub fn fetched(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_fetched())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
