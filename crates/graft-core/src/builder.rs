//! Build orchestration for grafting plugins onto a base template.
//!
//! The pipeline runs strictly in order and stops at the first failure:
//!
//! | Stage | Effect |
//! |---|---|
//! | `generate` | descriptors become entries with unique aliases |
//! | `write-registry` | registration file is deleted, then rewritten |
//! | `write-manifest` | manifest is deleted, then rewritten |
//! | `resolve` | `<go> get <module>@<version>` per non-replaced entry |
//! | `normalize-legacy` | `<go> mod tidy -go=<legacy baseline>` |
//! | `normalize-current` | `<go> mod tidy -go=<current baseline>` |
//! | `compile` | `<go> build ... -o <staging> <entry point>`, then move |
//!
//! Both artifacts are rendered before either file is touched, so a render
//! failure leaves the tree as it was. Past that point nothing is rolled
//! back: the template tree is scratch space and is expected to be
//! regenerated on every run.
//!
//! The process working directory is never changed. Every toolchain command
//! receives the template root as its own working directory, which keeps
//! builds of different trees within one process independent.

use std::path::{Path, PathBuf};
use std::time::Instant;

use graft_schema::{ModuleDescriptor, ToolchainConfig, TreeLayout};
use rand::Rng;

use crate::alias::AliasGenerator;
use crate::entry::Template;
use crate::error::BuildError;
use crate::render::{self, ManifestHeader, RenderError};
use crate::reporter::Reporter;
use crate::stage::Stage;
use crate::toolchain::{Invocation, Toolchain};

/// Binary name used when the entry point's directory gives no better one.
const DEFAULT_BINARY_NAME: &str = "app";

/// Everything one build needs.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Root of the base template's source tree.
    pub root: PathBuf,
    /// Plugins to graft, in registration order.
    pub modules: Vec<ModuleDescriptor>,
    /// Destination of the binary. An existing directory receives a file
    /// named after the entry point's directory.
    pub output: PathBuf,
    /// Extra arguments for the compile command.
    pub build_args: Vec<String>,
    /// Paths of the generated files inside `root`.
    pub layout: TreeLayout,
    /// Toolchain program and baselines.
    pub toolchain: ToolchainConfig,
}

impl BuildRequest {
    /// Request with the default layout and toolchain.
    pub fn new(
        root: impl Into<PathBuf>,
        modules: Vec<ModuleDescriptor>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root: root.into(),
            modules,
            output: output.into(),
            build_args: Vec::new(),
            layout: TreeLayout::default(),
            toolchain: ToolchainConfig::default(),
        }
    }

    /// Set extra compile arguments.
    pub fn with_build_args(mut self, args: Vec<String>) -> Self {
        self.build_args = args;
        self
    }

    /// Override the tree layout.
    pub fn with_layout(mut self, layout: TreeLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Override the toolchain settings.
    pub fn with_toolchain(mut self, toolchain: ToolchainConfig) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Where the binary ends up once the build succeeds. Relative paths
    /// are made absolute against the process working directory, the same
    /// place the final move resolves them.
    pub fn resolved_output(&self) -> PathBuf {
        let output = if self.output.is_dir() {
            self.output.join(binary_name(&self.layout))
        } else {
            self.output.clone()
        };
        std::path::absolute(&output).unwrap_or(output)
    }
}

/// What a build would do, computed without touching the tree.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Generated entries, in input order.
    pub template: Template,
    /// Rendered registration file.
    pub registry: String,
    /// Rendered manifest.
    pub manifest: String,
    /// Toolchain commands, in execution order.
    pub invocations: Vec<Invocation>,
    /// Final location of the binary.
    pub output: PathBuf,
}

/// Rendered artifacts for one build.
struct Artifacts {
    template: Template,
    registry: String,
    manifest: String,
}

/// Drives the pipeline described in the [module-level documentation](self).
pub struct Builder<'a> {
    toolchain: &'a dyn Toolchain,
    reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for Builder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder").finish_non_exhaustive()
    }
}

impl<'a> Builder<'a> {
    /// Create a builder that runs commands through `toolchain` and reports
    /// to `reporter`.
    pub fn new(toolchain: &'a dyn Toolchain, reporter: &'a dyn Reporter) -> Self {
        Self {
            toolchain,
            reporter,
        }
    }

    /// Run the whole pipeline and return the path of the compiled binary.
    ///
    /// # Errors
    ///
    /// Returns the [`BuildError`] of the first stage that fails. Files
    /// written by earlier stages are left in place.
    pub fn build(&self, request: &BuildRequest) -> Result<PathBuf, BuildError> {
        self.build_with(request, &mut AliasGenerator::new())
    }

    /// [`Builder::build`] with a caller-supplied alias source.
    ///
    /// # Errors
    ///
    /// See [`Builder::build`].
    pub fn build_with<R: Rng>(
        &self,
        request: &BuildRequest,
        aliases: &mut AliasGenerator<R>,
    ) -> Result<PathBuf, BuildError> {
        let start = Instant::now();
        let result = self.run(request, aliases);

        match &result {
            Ok(output) => self
                .reporter
                .finished(output, start.elapsed().as_secs_f64()),
            Err(err) => {
                if let Some(stage) = err.stage() {
                    self.reporter.failed(stage, &err.to_string());
                }
            }
        }

        result
    }

    /// Render both artifacts and list the commands a build would run,
    /// without modifying the template tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the template root or its manifest cannot be
    /// read, or if an artifact fails to render.
    pub fn plan(&self, request: &BuildRequest) -> Result<BuildPlan, BuildError> {
        let root = template_root(&request.root)?;
        let artifacts = self.render(request, &root, &mut AliasGenerator::new())?;
        let output = request.resolved_output();
        let invocations = invocations(request, &artifacts.template, &output)?;

        Ok(BuildPlan {
            template: artifacts.template,
            registry: artifacts.registry,
            manifest: artifacts.manifest,
            invocations,
            output,
        })
    }

    fn run<R: Rng>(
        &self,
        request: &BuildRequest,
        aliases: &mut AliasGenerator<R>,
    ) -> Result<PathBuf, BuildError> {
        let root = template_root(&request.root)?;
        let artifacts = self.render(request, &root, aliases)?;

        self.reporter.stage(Stage::WriteRegistry);
        replace_file(
            Stage::WriteRegistry,
            &request.layout.registry_path(&root),
            &artifacts.registry,
        )?;

        self.reporter.stage(Stage::WriteManifest);
        replace_file(
            Stage::WriteManifest,
            &request.layout.manifest_path(&root),
            &artifacts.manifest,
        )?;

        // The binary is compiled into a scratch directory inside the tree
        // and only moved to the requested path after the compile succeeds.
        let staging = tempfile::Builder::new()
            .prefix(".graft-build-")
            .tempdir_in(&root)
            .map_err(|e| BuildError::fs(Stage::Compile, "create staging dir in", &root, e))?;
        let staged = staging.path().join(binary_name(&request.layout));

        let invocations = invocations(request, &artifacts.template, &staged)?;
        if artifacts.template.fetched().next().is_none() {
            self.reporter.stage(Stage::Resolve);
            self.reporter.info("No modules to fetch, all plugins are replaced locally");
        }

        let mut current = None;
        for invocation in &invocations {
            if current != Some(invocation.stage) {
                current = Some(invocation.stage);
                self.reporter.stage(invocation.stage);
            }
            self.reporter
                .command(invocation.stage, &invocation.to_string(), &root);
            self.toolchain.run(invocation, &root, self.reporter)?;
        }

        let output = request.resolved_output();
        move_binary(&staged, &output)?;
        Ok(output)
    }

    /// Generate entries and render both artifacts. Pure apart from reading
    /// the existing manifest's module directive.
    fn render<R: Rng>(
        &self,
        request: &BuildRequest,
        root: &Path,
        aliases: &mut AliasGenerator<R>,
    ) -> Result<Artifacts, BuildError> {
        self.reporter.stage(Stage::Generate);
        for module in &request.modules {
            if let Some(pseudo) = module.pseudo_version() {
                tracing::debug!(module = %module.module_name, pseudo_version = pseudo, "descriptor");
            }
        }
        let template = Template::generate(&request.modules, aliases);
        self.reporter
            .info(&format!("Generated {} plugin entries", template.len()));

        let registry = render::render_registry(&template, &registry_package(&request.layout))
            .map_err(|source| BuildError::Render {
                stage: Stage::WriteRegistry,
                source,
            })?;

        let manifest_path = request.layout.manifest_path(root);
        let existing = std::fs::read_to_string(&manifest_path)
            .map_err(|e| BuildError::fs(Stage::WriteManifest, "read", &manifest_path, e))?;
        let module = render::module_path(&existing).ok_or_else(|| BuildError::Render {
            stage: Stage::WriteManifest,
            source: RenderError::Header(format!(
                "{} has no module directive",
                manifest_path.display()
            )),
        })?;
        let header = ManifestHeader {
            module,
            baseline: request.toolchain.legacy_baseline.clone(),
        };
        let manifest =
            render::render_manifest(&template, &header).map_err(|source| BuildError::Render {
                stage: Stage::WriteManifest,
                source,
            })?;

        Ok(Artifacts {
            template,
            registry,
            manifest,
        })
    }
}

/// Toolchain commands for the resolve, normalize and compile stages.
fn invocations(
    request: &BuildRequest,
    template: &Template,
    output: &Path,
) -> Result<Vec<Invocation>, BuildError> {
    let program = &request.toolchain.program;
    let mut list = Vec::with_capacity(template.len() + 3);

    for (index, entry) in template.entries().iter().enumerate() {
        if !entry.is_fetched() {
            continue;
        }
        let Some(version) = entry.version.as_deref() else {
            return Err(BuildError::Render {
                stage: Stage::Resolve,
                source: RenderError::MissingVersion {
                    index,
                    module: entry.module.to_string(),
                },
            });
        };
        list.push(Invocation::resolve(program, &entry.module, version));
    }

    list.push(Invocation::normalize(
        Stage::NormalizeLegacy,
        program,
        &request.toolchain.legacy_baseline,
    ));
    list.push(Invocation::normalize(
        Stage::NormalizeCurrent,
        program,
        &request.toolchain.current_baseline,
    ));
    list.push(Invocation::compile(
        program,
        &request.build_args,
        output,
        &request.layout.entry_point,
    ));

    Ok(list)
}

/// Canonical template root, so relative paths handed to child processes
/// resolve the same way they do here.
fn template_root(root: &Path) -> Result<PathBuf, BuildError> {
    let invalid = |reason: String| BuildError::InvalidTemplate {
        path: root.to_path_buf(),
        reason,
    };
    let canonical = root.canonicalize().map_err(|e| invalid(e.to_string()))?;
    if !canonical.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    Ok(canonical)
}

/// Delete `path`, then write `contents` in its place. A missing file is an
/// error: it means the tree is not the expected template.
fn replace_file(stage: Stage, path: &Path, contents: &str) -> Result<(), BuildError> {
    std::fs::remove_file(path).map_err(|e| BuildError::fs(stage, "remove", path, e))?;
    std::fs::write(path, contents).map_err(|e| BuildError::fs(stage, "write", path, e))?;
    tracing::debug!(stage = %stage, path = %path.display(), bytes = contents.len(), "replaced");
    Ok(())
}

/// Move the staged binary to `output`. Prefer rename (atomic on the same
/// filesystem) with copy fallback.
fn move_binary(staged: &Path, output: &Path) -> Result<(), BuildError> {
    if !staged.is_file() {
        return Err(BuildError::fs(
            Stage::Compile,
            "locate compiled binary at",
            staged,
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| BuildError::fs(Stage::Compile, "create", parent, e))?;
    }
    if std::fs::rename(staged, output).is_err() {
        std::fs::copy(staged, output)
            .map_err(|e| BuildError::fs(Stage::Compile, "copy binary to", output, e))?;
    }
    Ok(())
}

/// `cmd/rr/main.go` builds a binary called `rr`.
fn binary_name(layout: &TreeLayout) -> String {
    let stem = layout
        .entry_point
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_BINARY_NAME);
    format!("{stem}{}", std::env::consts::EXE_SUFFIX)
}

/// `internal/container/plugins.go` declares `package container`.
fn registry_package(layout: &TreeLayout) -> String {
    layout
        .registry
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .map_or_else(|| "main".to_string(), |n| n.replace(['-', '.'], "_"))
}
