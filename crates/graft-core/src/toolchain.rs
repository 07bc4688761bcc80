//! Toolchain invocations.
//!
//! Each invocation is a child process started in the template root. Its
//! stdout and stderr are read line by line while the process runs and
//! forwarded to the [`Reporter`] as they arrive, not buffered until exit.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{BuildError, ExitCode};
use crate::reporter::Reporter;
use crate::stage::Stage;

/// A single toolchain command line and the stage it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Pipeline stage this command implements.
    pub stage: Stage,
    /// Executable to run.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
}

impl Invocation {
    /// `<program> get <module>@<version>`
    pub fn resolve(program: &str, module: &str, version: &str) -> Self {
        Self {
            stage: Stage::Resolve,
            program: program.to_string(),
            args: vec!["get".to_string(), format!("{module}@{version}")],
        }
    }

    /// `<program> mod tidy -go=<baseline>` for one of the two
    /// normalization stages.
    pub fn normalize(stage: Stage, program: &str, baseline: &str) -> Self {
        debug_assert!(matches!(
            stage,
            Stage::NormalizeLegacy | Stage::NormalizeCurrent
        ));
        Self {
            stage,
            program: program.to_string(),
            args: vec![
                "mod".to_string(),
                "tidy".to_string(),
                format!("-go={baseline}"),
            ],
        }
    }

    /// `<program> build [-v <extra>...] -o <output> <entry point>`
    ///
    /// Verbose output is only requested when extra arguments are given.
    pub fn compile(program: &str, extra: &[String], output: &Path, entry_point: &Path) -> Self {
        let mut args = Vec::with_capacity(extra.len() + 5);
        args.push("build".to_string());
        if !extra.is_empty() {
            args.push("-v".to_string());
            args.extend(extra.iter().cloned());
        }
        args.push("-o".to_string());
        args.push(output.to_string_lossy().into_owned());
        args.push(entry_point.to_string_lossy().into_owned());

        Self {
            stage: Stage::Compile,
            program: program.to_string(),
            args,
        }
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Runs invocations. The builder depends on this seam so tests can record
/// commands instead of spawning a real toolchain.
pub trait Toolchain: Send + Sync {
    /// Run `invocation` with `cwd` as its working directory, forwarding
    /// output lines to `reporter`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Spawn`] if the process cannot be started and
    /// [`BuildError::Toolchain`] if it exits unsuccessfully.
    fn run(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        reporter: &dyn Reporter,
    ) -> Result<(), BuildError>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessToolchain;

impl Toolchain for ProcessToolchain {
    fn run(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        reporter: &dyn Reporter,
    ) -> Result<(), BuildError> {
        let stage = invocation.stage;
        let spawn_err = |source| BuildError::Spawn {
            stage,
            command: invocation.to_string(),
            source,
        };

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Drain both pipes at once; a child blocked on a full stderr pipe
        // would otherwise never close stdout.
        std::thread::scope(|scope| {
            if let Some(stderr) = stderr {
                scope.spawn(move || forward_lines(stderr, stage, reporter));
            }
            if let Some(stdout) = stdout {
                forward_lines(stdout, stage, reporter);
            }
        });

        let status = child.wait().map_err(spawn_err)?;
        if !status.success() {
            return Err(BuildError::Toolchain {
                stage,
                command: invocation.to_string(),
                exit: ExitCode(status.code()),
            });
        }

        Ok(())
    }
}

/// Forward each line read from `reader` until EOF or a read error.
fn forward_lines<R: Read>(reader: R, stage: Stage, reporter: &dyn Reporter) {
    for chunk in BufReader::new(reader).split(b'\n') {
        let Ok(bytes) = chunk else {
            break;
        };
        let line = String::from_utf8_lossy(&bytes);
        reporter.output_line(stage, line.trim_end_matches('\r'));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::NullReporter;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl Reporter for Lines {
        fn stage(&self, _: Stage) {}
        fn command(&self, _: Stage, _: &str, _: &Path) {}
        fn output_line(&self, _: Stage, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
        fn failed(&self, _: Stage, _: &str) {}
        fn info(&self, _: &str) {}
        fn finished(&self, _: &Path, _: f64) {}
    }

    #[test]
    fn test_resolve_args() {
        let inv = Invocation::resolve("go", "github.com/acme/cache", "v1.2.0");
        assert_eq!(inv.args, ["get", "github.com/acme/cache@v1.2.0"]);
        assert_eq!(inv.to_string(), "go get github.com/acme/cache@v1.2.0");
    }

    #[test]
    fn test_normalize_args() {
        let inv = Invocation::normalize(Stage::NormalizeLegacy, "go", "1.16");
        assert_eq!(inv.to_string(), "go mod tidy -go=1.16");
        assert_eq!(inv.stage, Stage::NormalizeLegacy);
    }

    #[test]
    fn test_compile_without_extra_args() {
        let inv = Invocation::compile(
            "go",
            &[],
            &PathBuf::from("/out/rr"),
            Path::new("cmd/rr/main.go"),
        );
        assert_eq!(inv.args, ["build", "-o", "/out/rr", "cmd/rr/main.go"]);
    }

    #[test]
    fn test_compile_with_extra_args() {
        let extra = vec!["-trimpath".to_string(), "-ldflags=-s -w".to_string()];
        let inv = Invocation::compile(
            "go",
            &extra,
            Path::new("/out/rr"),
            Path::new("cmd/rr/main.go"),
        );
        assert_eq!(
            inv.args,
            [
                "build",
                "-v",
                "-trimpath",
                "-ldflags=-s -w",
                "-o",
                "/out/rr",
                "cmd/rr/main.go"
            ]
        );
        assert_eq!(
            inv.to_string(),
            "go build -v -trimpath '-ldflags=-s -w' -o /out/rr cmd/rr/main.go"
        );
    }

    #[test]
    fn test_forward_lines_splits_and_strips_cr() {
        let lines = Lines::default();
        forward_lines(&b"one\r\ntwo\nthree"[..], Stage::Resolve, &lines);
        assert_eq!(*lines.0.lock().unwrap(), ["one", "two", "three"]);
    }

    #[test]
    fn test_forward_lines_tolerates_invalid_utf8() {
        let lines = Lines::default();
        forward_lines(&b"ok\n\xff\xfe\n"[..], Stage::Compile, &lines);
        let got = lines.0.lock().unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], "ok");
    }

    #[cfg(unix)]
    #[test]
    fn test_process_streams_both_pipes() {
        let dir = tempfile::tempdir().unwrap();
        let lines = Lines::default();
        let inv = Invocation {
            stage: Stage::Resolve,
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), "echo out; echo err >&2; pwd".to_string()],
        };
        ProcessToolchain.run(&inv, dir.path(), &lines).unwrap();

        let got = lines.0.lock().unwrap();
        assert!(got.contains(&"out".to_string()));
        assert!(got.contains(&"err".to_string()));
        let cwd = dir.path().canonicalize().unwrap();
        assert!(got.iter().any(|l| Path::new(l).canonicalize().ok().as_ref() == Some(&cwd)));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation {
            stage: Stage::NormalizeCurrent,
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), "exit 3".to_string()],
        };
        let err = ProcessToolchain.run(&inv, dir.path(), &NullReporter).unwrap_err();
        match err {
            BuildError::Toolchain { stage, exit, .. } => {
                assert_eq!(stage, Stage::NormalizeCurrent);
                assert_eq!(exit, ExitCode(Some(3)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_process_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation::resolve("graft-no-such-toolchain", "pkgA", "v1");
        let err = ProcessToolchain.run(&inv, dir.path(), &NullReporter).unwrap_err();
        assert!(matches!(err, BuildError::Spawn { stage: Stage::Resolve, .. }));
    }
}
