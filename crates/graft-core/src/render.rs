//! Rendering of the two generated artifacts.
//!
//! Both functions are pure: they only build strings. Writing them into the
//! template tree is the builder's job.
//!
//! The registration file imports every plugin under its alias and returns
//! one instance per entry, in input order:
//!
//! ```text
//! package container
//!
//! import (
//!     qWfRt "github.com/acme/logger/v4"
//! )
//!
//! func Plugins() []any {
//!     return []any{
//!         &qWfRt.Plugin{},
//!     }
//! }
//! ```
//!
//! The manifest carries the template's module path, the legacy baseline,
//! one requirement per entry and one substitution directive per replaced
//! entry.

use std::fmt::Write;

use thiserror::Error;

use crate::entry::{Entry, Template};

/// Placeholder version for modules that are only reachable through a
/// substitution directive.
pub const ZERO_PSEUDO_VERSION: &str = "v0.0.0-00010101000000-000000000000";

const GENERATED_HEADER: &str = "// Code generated by graft. DO NOT EDIT.";

/// A field of an entry could not be substituted into an artifact.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The entry has no module path.
    #[error("entry {index}: module path is empty")]
    EmptyModule {
        /// Position of the entry in the template.
        index: usize,
    },

    /// The module path cannot appear in an import or requirement.
    #[error("entry {index}: module path '{module}' contains whitespace or quotes")]
    MalformedModule {
        /// Position of the entry in the template.
        index: usize,
        /// Offending module path.
        module: String,
    },

    /// Neither a version nor a substitution path was given.
    #[error("entry {index} ({module}): no version and no replace path")]
    MissingVersion {
        /// Position of the entry in the template.
        index: usize,
        /// Module missing a version.
        module: String,
    },

    /// The version or replace path contains characters the manifest
    /// format cannot hold.
    #[error("entry {index} ({module}): invalid {field} '{value}'")]
    InvalidField {
        /// Position of the entry in the template.
        index: usize,
        /// Module the field belongs to.
        module: String,
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// The manifest header is unusable.
    #[error("invalid manifest header: {0}")]
    Header(String),

    /// Formatting into the output buffer failed.
    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

/// Values written at the top of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestHeader {
    /// Module path of the template itself.
    pub module: String,
    /// Toolchain baseline declared before normalization.
    pub baseline: String,
}

/// Render the plugin-registration source file.
///
/// `package` is the package clause of the generated file, normally the
/// name of the directory that holds it.
///
/// # Errors
///
/// Returns a [`RenderError`] if an entry's module path is empty or
/// malformed, or if `package` is not an identifier.
pub fn render_registry(template: &Template, package: &str) -> Result<String, RenderError> {
    if package.is_empty() || !package.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RenderError::Header(format!(
            "'{package}' is not a valid package name"
        )));
    }
    for (index, entry) in template.entries().iter().enumerate() {
        check_module(index, entry)?;
    }

    let mut out = String::new();
    writeln!(out, "{GENERATED_HEADER}")?;
    writeln!(out)?;
    writeln!(out, "package {package}")?;

    if !template.is_empty() {
        writeln!(out)?;
        writeln!(out, "import (")?;
        for entry in template.entries() {
            writeln!(out, "\t{} \"{}\"", entry.prefix, entry.module)?;
        }
        writeln!(out, ")")?;
    }

    writeln!(out)?;
    writeln!(out, "// Plugins returns one instance of every grafted plugin.")?;
    writeln!(out, "func Plugins() []any {{")?;
    writeln!(out, "\treturn []any{{")?;
    for entry in template.entries() {
        writeln!(out, "\t\t&{}.{},", entry.prefix, entry.structure)?;
    }
    writeln!(out, "\t}}")?;
    writeln!(out, "}}")?;

    Ok(out)
}

/// Render the dependency manifest.
///
/// # Errors
///
/// Returns a [`RenderError`] if the header is empty, an entry's module
/// path is empty or malformed, an entry has neither a version nor a
/// replace path, or a value contains characters the manifest cannot hold.
pub fn render_manifest(template: &Template, header: &ManifestHeader) -> Result<String, RenderError> {
    if header.module.trim().is_empty() {
        return Err(RenderError::Header("module path is empty".to_string()));
    }
    if header.baseline.trim().is_empty() {
        return Err(RenderError::Header("baseline is empty".to_string()));
    }

    let mut requires = Vec::with_capacity(template.len());
    let mut replaces = Vec::new();
    for (index, entry) in template.entries().iter().enumerate() {
        check_module(index, entry)?;

        let version = match (entry.version.as_deref(), entry.replace.as_deref()) {
            (Some(version), _) => {
                if version.chars().any(|c| c.is_whitespace() || c.is_control()) {
                    return Err(invalid_field(index, entry, "version", version));
                }
                version
            }
            (None, Some(_)) => ZERO_PSEUDO_VERSION,
            (None, None) => {
                return Err(RenderError::MissingVersion {
                    index,
                    module: entry.module.to_string(),
                });
            }
        };
        requires.push((entry.module.as_str(), version));

        if let Some(path) = entry.replace.as_deref() {
            if path.chars().any(char::is_control) {
                return Err(invalid_field(index, entry, "replace path", path));
            }
            replaces.push((entry.module.as_str(), quote_path(path)));
        }
    }

    let mut out = String::new();
    writeln!(out, "module {}", header.module.trim())?;
    writeln!(out)?;
    writeln!(out, "go {}", header.baseline.trim())?;

    if !requires.is_empty() {
        writeln!(out)?;
        writeln!(out, "require (")?;
        for (module, version) in &requires {
            writeln!(out, "\t{module} {version}")?;
        }
        writeln!(out, ")")?;
    }

    if !replaces.is_empty() {
        writeln!(out)?;
        for (module, path) in &replaces {
            writeln!(out, "replace {module} => {path}")?;
        }
    }

    Ok(out)
}

/// Extract the `module` directive from an existing manifest.
pub fn module_path(manifest: &str) -> Option<String> {
    manifest.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then(|| path.to_string())
    })
}

fn check_module(index: usize, entry: &Entry) -> Result<(), RenderError> {
    if entry.module.is_empty() {
        return Err(RenderError::EmptyModule { index });
    }
    if !entry.module.is_well_formed() {
        return Err(RenderError::MalformedModule {
            index,
            module: entry.module.to_string(),
        });
    }
    Ok(())
}

fn invalid_field(index: usize, entry: &Entry, field: &'static str, value: &str) -> RenderError {
    RenderError::InvalidField {
        index,
        module: entry.module.to_string(),
        field,
        value: value.to_string(),
    }
}

/// Paths with spaces or quotes must be written as quoted strings.
fn quote_path(path: &str) -> String {
    if path.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\') {
        let escaped = path.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        path.to_string()
    }
}
