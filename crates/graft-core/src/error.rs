//! Errors raised by the build pipeline.
//!
//! Every variant records the [`Stage`] it came from so callers can report
//! which step of the build failed. Nothing is rolled back: files written
//! before the failing stage stay on disk.

use std::path::PathBuf;
use thiserror::Error;

use crate::render::RenderError;
use crate::stage::Stage;

/// Failure of a single pipeline stage.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The template root is missing or is not a usable source tree.
    #[error("template at {} is unusable: {reason}", path.display())]
    InvalidTemplate {
        /// Template root that was checked.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// A filesystem operation on a generated or output file failed.
    #[error("{stage}: failed to {action} {}: {source}", path.display())]
    Fs {
        /// Stage that attempted the operation.
        stage: Stage,
        /// Operation verb, e.g. `remove` or `write`.
        action: &'static str,
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// An artifact could not be rendered from the entries.
    #[error("{stage}: {source}")]
    Render {
        /// Stage whose artifact failed to render.
        stage: Stage,
        /// What could not be substituted.
        #[source]
        source: RenderError,
    },

    /// The toolchain process could not be started or waited on.
    #[error("{stage}: failed to run `{command}`: {source}")]
    Spawn {
        /// Stage that ran the command.
        stage: Stage,
        /// Full command line.
        command: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The toolchain process ran and reported failure.
    #[error("{stage}: `{command}` failed with {exit}")]
    Toolchain {
        /// Stage that ran the command.
        stage: Stage,
        /// Full command line.
        command: String,
        /// How the process ended.
        exit: ExitCode,
    },
}

impl BuildError {
    /// Stage in which the error occurred, if it belongs to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::InvalidTemplate { .. } => None,
            Self::Fs { stage, .. }
            | Self::Render { stage, .. }
            | Self::Spawn { stage, .. }
            | Self::Toolchain { stage, .. } => Some(*stage),
        }
    }

    pub(crate) fn fs(
        stage: Stage,
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Fs {
            stage,
            action,
            path: path.into(),
            source,
        }
    }
}

/// Exit status of a failed child process. `None` means it was killed by a
/// signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub Option<i32>);

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("termination by signal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolchain_error_message() {
        let err = BuildError::Toolchain {
            stage: Stage::Compile,
            command: "go build -o rr cmd/rr/main.go".to_string(),
            exit: ExitCode(Some(2)),
        };
        assert_eq!(
            err.to_string(),
            "compile: `go build -o rr cmd/rr/main.go` failed with exit code 2"
        );
        assert_eq!(err.stage(), Some(Stage::Compile));
    }

    #[test]
    fn test_fs_error_names_path() {
        let err = BuildError::fs(
            Stage::WriteRegistry,
            "write",
            "/tmp/rr/internal/container/plugins.go",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        let msg = err.to_string();
        assert!(msg.starts_with(
            "write-registry: failed to write /tmp/rr/internal/container/plugins.go"
        ));
    }

    #[test]
    fn test_signal_exit() {
        assert_eq!(ExitCode(None).to_string(), "termination by signal");
    }
}
