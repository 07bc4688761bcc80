//! `graft.toml` configuration.
//!
//! Every section is optional; omitted sections fall back to the defaults
//! documented on each type. The `[[plugins]]` array is the input consumed
//! by the static provider in `graft-core`.

use crate::types::ModuleDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Errors that can occur when loading a [`GraftConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file that failed to load.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but a value is unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration parsed from `graft.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraftConfig {
    /// Where the base template lives.
    pub template: TemplateSettings,
    /// Output and extra arguments for the final compile.
    pub build: BuildSettings,
    /// Toolchain program and manifest baselines.
    pub toolchain: ToolchainConfig,
    /// Fixed paths inside the template tree.
    pub layout: TreeLayout,
    /// Plugin modules to graft onto the template, in registration order.
    pub plugins: Vec<ModuleDescriptor>,
}

/// The `[template]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Root of the base template's source tree. May be supplied on the
    /// command line instead.
    pub path: Option<PathBuf>,
}

/// The `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Destination of the compiled binary. `.` means the current directory.
    pub output: PathBuf,
    /// Extra arguments passed through to the compile command.
    pub args: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("."),
            args: Vec::new(),
        }
    }
}

/// The `[toolchain]` section.
///
/// Manifest normalization runs twice: first under `legacy_baseline`, then
/// under `current_baseline`, which becomes the manifest's declared minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Toolchain executable, resolved through `PATH` unless absolute.
    pub program: String,
    /// Baseline for the first normalization pass.
    pub legacy_baseline: String,
    /// Baseline for the second normalization pass.
    pub current_baseline: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: "go".to_string(),
            legacy_baseline: "1.16".to_string(),
            current_baseline: "1.17".to_string(),
        }
    }
}

/// The `[layout]` section: tree-relative paths of the generated files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeLayout {
    /// Generated plugin-registration source file.
    pub registry: PathBuf,
    /// Dependency manifest.
    pub manifest: PathBuf,
    /// Entry point handed to the compile command.
    pub entry_point: PathBuf,
}

impl Default for TreeLayout {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("internal/container/plugins.go"),
            manifest: PathBuf::from("go.mod"),
            entry_point: PathBuf::from("cmd/rr/main.go"),
        }
    }
}

impl TreeLayout {
    /// Absolute path of the registration file under `root`.
    pub fn registry_path(&self, root: &Path) -> PathBuf {
        root.join(&self.registry)
    }

    /// Absolute path of the manifest under `root`.
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifest)
    }
}

impl GraftConfig {
    /// Parse and validate a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when a value fails validation.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// the errors documented on [`GraftConfig::parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Check values that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.toolchain.program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "toolchain.program must not be empty".to_string(),
            ));
        }
        if self.toolchain.legacy_baseline.trim().is_empty()
            || self.toolchain.current_baseline.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "toolchain baselines must not be empty".to_string(),
            ));
        }

        for (field, path) in [
            ("layout.registry", &self.layout.registry),
            ("layout.manifest", &self.layout.manifest),
            ("layout.entry_point", &self.layout.entry_point),
        ] {
            let escapes = path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
            if path.as_os_str().is_empty() || path.is_absolute() || escapes {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be a relative path inside the template, got '{}'",
                    path.display()
                )));
            }
        }

        for (i, plugin) in self.plugins.iter().enumerate() {
            if plugin.module_name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "plugins[{i}]: module_name must not be empty"
                )));
            }
            if plugin.version().is_none() && plugin.replace().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "plugins[{i}] ({}): either version or replace is required",
                    plugin.module_name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GraftConfig::parse("").unwrap();
        assert_eq!(config.toolchain, ToolchainConfig::default());
        assert_eq!(config.layout, TreeLayout::default());
        assert_eq!(config.build.output, PathBuf::from("."));
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = GraftConfig::parse(
            r#"
[template]
path = "/tmp/roadrunner"

[build]
output = "/usr/local/bin/rr"
args = ["-trimpath", "-ldflags", "-s"]

[toolchain]
program = "/opt/go/bin/go"
legacy_baseline = "1.21"
current_baseline = "1.22"

[[plugins]]
module_name = "github.com/roadrunner-server/logger/v4"
version = "v4.2.0"

[[plugins]]
module_name = "github.com/acme/local"
replace = "/src/local"
"#,
        )
        .unwrap();

        assert_eq!(config.template.path, Some(PathBuf::from("/tmp/roadrunner")));
        assert_eq!(config.build.args, ["-trimpath", "-ldflags", "-s"]);
        assert_eq!(config.toolchain.current_baseline, "1.22");
        assert_eq!(config.layout.manifest, PathBuf::from("go.mod"));
        assert_eq!(config.plugins.len(), 2);
        assert_eq!(config.plugins[1].replace(), Some("/src/local"));
    }

    #[test]
    fn test_plugin_without_version_or_replace_is_rejected() {
        let err = GraftConfig::parse(
            r#"
[[plugins]]
module_name = "github.com/acme/cache"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("github.com/acme/cache"));
    }

    #[test]
    fn test_absolute_layout_is_rejected() {
        let err = GraftConfig::parse(
            r#"
[layout]
manifest = "/etc/go.mod"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("layout.manifest"));
    }

    #[test]
    fn test_parent_dir_layout_is_rejected() {
        let err = GraftConfig::parse(
            r#"
[layout]
registry = "../../etc/plugins.go"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("layout.registry"));

        let err = GraftConfig::parse("[layout]\nentry_point = \"cmd/../../main.go\"\n").unwrap_err();
        assert!(err.to_string().contains("layout.entry_point"));
    }

    #[test]
    fn test_nested_layout_is_accepted() {
        let config =
            GraftConfig::parse("[layout]\nregistry = \"./internal/plugins/registry.go\"\n").unwrap();
        assert_eq!(
            config.layout.registry,
            PathBuf::from("./internal/plugins/registry.go")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GraftConfig::load(&dir.path().join("graft.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_layout_paths() {
        let layout = TreeLayout::default();
        let root = Path::new("/work/rr");
        assert_eq!(
            layout.registry_path(root),
            PathBuf::from("/work/rr/internal/container/plugins.go")
        );
        assert_eq!(layout.manifest_path(root), PathBuf::from("/work/rr/go.mod"));
    }
}
