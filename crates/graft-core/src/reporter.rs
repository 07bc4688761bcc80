//! Reporter trait for dependency injection
//!
//! The builder reports stage transitions, executed commands and every line
//! of toolchain output through this trait instead of logging directly, so
//! the CLI, tests and embedders can each decide where the output goes.

use std::path::Path;

use crate::stage::Stage;

/// Sink for pipeline progress and toolchain output.
pub trait Reporter: Send + Sync {
    /// A pipeline stage has started.
    fn stage(&self, stage: Stage);

    /// A toolchain command is about to run in `cwd`.
    fn command(&self, stage: Stage, command: &str, cwd: &Path);

    /// One line of combined stdout/stderr from the running command.
    fn output_line(&self, stage: Stage, line: &str);

    /// A stage failed; the pipeline stops after this call.
    fn failed(&self, stage: Stage, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// The binary was written to `output`.
    fn finished(&self, output: &Path, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn stage(&self, stage: Stage) {
        (**self).stage(stage);
    }
    fn command(&self, stage: Stage, command: &str, cwd: &Path) {
        (**self).command(stage, command, cwd);
    }
    fn output_line(&self, stage: Stage, line: &str) {
        (**self).output_line(stage, line);
    }
    fn failed(&self, stage: Stage, reason: &str) {
        (**self).failed(stage, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn finished(&self, output: &Path, elapsed_secs: f64) {
        (**self).finished(output, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., planning, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn stage(&self, _: Stage) {}
    fn command(&self, _: Stage, _: &str, _: &Path) {}
    fn output_line(&self, _: Stage, _: &str) {}
    fn failed(&self, _: Stage, _: &str) {}
    fn info(&self, _: &str) {}
    fn finished(&self, _: &Path, _: f64) {}
}

/// Forwards everything to `tracing` as structured events.
///
/// Child output goes out at `debug`, so it only shows up when the
/// subscriber's filter lets it through.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn stage(&self, stage: Stage) {
        tracing::info!(stage = %stage, "stage started");
    }

    fn command(&self, stage: Stage, command: &str, cwd: &Path) {
        tracing::info!(stage = %stage, cmd = %command, wd = %cwd.display(), "executing");
    }

    fn output_line(&self, stage: Stage, line: &str) {
        tracing::debug!(stage = %stage, line = %line, "toolchain output");
    }

    fn failed(&self, stage: Stage, reason: &str) {
        tracing::error!(stage = %stage, reason = %reason, "stage failed");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn finished(&self, output: &Path, elapsed_secs: f64) {
        tracing::info!(output = %output.display(), elapsed_secs, "build finished");
    }
}
