//! Turns `graft.toml` and command-line overrides into a [`BuildRequest`].

use anyhow::{Context, Result};
use graft_core::provider::{FileProvider, ModuleProvider, StaticProvider, collect_modules};
use graft_core::BuildRequest;
use graft_schema::GraftConfig;
use std::path::Path;

use crate::BuildArgs;

/// Looked up in the current directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "graft.toml";

/// Load the configuration. An explicit path must exist; the default file
/// is optional.
pub fn load(explicit: Option<&Path>) -> Result<GraftConfig> {
    if let Some(path) = explicit {
        return GraftConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let default = Path::new(DEFAULT_CONFIG_FILE);
    if default.exists() {
        GraftConfig::load(default).context("Failed to load graft.toml")
    } else {
        tracing::debug!("no graft.toml found, using defaults");
        Ok(GraftConfig::default())
    }
}

/// Merge `config` with `args`. Flags win over file values; plugin files
/// are appended after the config's own plugins.
pub fn build_request(config: GraftConfig, args: &BuildArgs) -> Result<BuildRequest> {
    let root = args
        .template
        .clone()
        .or_else(|| config.template.path.clone())
        .context("No template tree: pass --template or set [template].path in graft.toml")?;

    let mut output = args
        .out
        .clone()
        .unwrap_or_else(|| config.build.output.clone());
    if output == Path::new(".") {
        output = std::env::current_dir().context("Failed to resolve current directory")?;
    }

    let configured = StaticProvider::new("config", config.plugins);
    let files: Vec<FileProvider> = args.plugin_files.iter().map(FileProvider::new).collect();
    let mut providers: Vec<&dyn ModuleProvider> = vec![&configured];
    providers.extend(files.iter().map(|f| f as &dyn ModuleProvider));
    let modules = collect_modules(&providers)?;

    let build_args = if args.build_args.is_empty() {
        config.build.args
    } else {
        args.build_args.clone()
    };

    Ok(BuildRequest::new(root, modules, output)
        .with_build_args(build_args)
        .with_layout(config.layout)
        .with_toolchain(config.toolchain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const CONFIG: &str = r#"
[template]
path = "/srv/template"

[build]
output = "/srv/out/rr"
args = ["-trimpath"]

[toolchain]
legacy_baseline = "1.20"

[[plugins]]
module_name = "github.com/acme/logger/v4"
version = "v4.0.0"
"#;

    #[test]
    fn test_config_values_used_without_flags() {
        let config = GraftConfig::parse(CONFIG).unwrap();
        let request = build_request(config, &BuildArgs::default()).unwrap();

        assert_eq!(request.root, PathBuf::from("/srv/template"));
        assert_eq!(request.output, PathBuf::from("/srv/out/rr"));
        assert_eq!(request.build_args, ["-trimpath"]);
        assert_eq!(request.toolchain.legacy_baseline, "1.20");
        assert_eq!(request.toolchain.current_baseline, "1.17");
        assert_eq!(request.modules.len(), 1);
    }

    #[test]
    fn test_flags_override_config() {
        let config = GraftConfig::parse(CONFIG).unwrap();
        let args = BuildArgs {
            template: Some(PathBuf::from("/tmp/rr")),
            out: Some(PathBuf::from("/tmp/bin/rr")),
            plugin_files: Vec::new(),
            build_args: vec!["-race".to_string()],
        };
        let request = build_request(config, &args).unwrap();

        assert_eq!(request.root, PathBuf::from("/tmp/rr"));
        assert_eq!(request.output, PathBuf::from("/tmp/bin/rr"));
        assert_eq!(request.build_args, ["-race"]);
    }

    #[test]
    fn test_dot_output_is_current_dir() {
        let args = BuildArgs {
            template: Some(PathBuf::from("/tmp/rr")),
            ..BuildArgs::default()
        };
        let request = build_request(GraftConfig::default(), &args).unwrap();
        assert_eq!(request.output, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let err = build_request(GraftConfig::default(), &BuildArgs::default()).unwrap_err();
        assert!(err.to_string().contains("--template"));
    }

    #[test]
    fn test_plugin_files_appended_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let extra = dir.path().join("extra.toml");
        std::fs::write(
            &extra,
            "[[plugins]]\nmodule_name = \"gitlab.com/acme/metrics\"\nversion = \"v1.1.0\"\n",
        )
        .unwrap();

        let args = BuildArgs {
            plugin_files: vec![extra],
            ..BuildArgs::default()
        };
        let request = build_request(GraftConfig::parse(CONFIG).unwrap(), &args).unwrap();
        let names: Vec<_> = request
            .modules
            .iter()
            .map(|m| m.module_name.as_str())
            .collect();
        assert_eq!(names, ["github.com/acme/logger/v4", "gitlab.com/acme/metrics"]);
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("graft.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
