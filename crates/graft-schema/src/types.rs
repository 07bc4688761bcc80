//! Plugin module identity and descriptor types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Canonical import path of a plugin package
/// (e.g. `github.com/roadrunner-server/logger/v4`).
///
/// Module paths are case-sensitive, so unlike most identifiers in the
/// workspace the input is stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Create a module name from a raw import path.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Return the import path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the path is usable as an import: non-empty and free of
    /// whitespace and quote characters.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && !self
                .0
                .chars()
                .any(|c| c.is_whitespace() || c == '"' || c == '`' || c == '\'')
    }
}

impl std::fmt::Display for ModuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for ModuleName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for ModuleName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ModuleName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One pluggable unit and the revision it should be built at.
///
/// Descriptors are produced by a provider before the pipeline starts and
/// are never mutated afterwards. Empty strings in the optional fields are
/// treated the same as absent values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Import path of the plugin package.
    pub module_name: ModuleName,

    /// Commit hash or tag to fetch. Required unless `replace` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Pseudo-version reported by some providers. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pseudo_version: Option<String>,

    /// Local path substituted for the module. Skips dependency resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<String>,
}

impl ModuleDescriptor {
    /// Descriptor for a module fetched at `version`.
    pub fn fetched(module_name: impl Into<ModuleName>, version: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            version: Some(version.into()),
            pseudo_version: None,
            replace: None,
        }
    }

    /// Descriptor for a module substituted by a local checkout.
    pub fn replaced(module_name: impl Into<ModuleName>, path: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            version: None,
            pseudo_version: None,
            replace: Some(path.into()),
        }
    }

    /// The version, if present and non-empty.
    pub fn version(&self) -> Option<&str> {
        non_empty(self.version.as_deref())
    }

    /// The pseudo-version, if present and non-empty.
    pub fn pseudo_version(&self) -> Option<&str> {
        non_empty(self.pseudo_version.as_deref())
    }

    /// The local replacement path, if present and non-empty.
    pub fn replace(&self) -> Option<&str> {
        non_empty(self.replace.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
