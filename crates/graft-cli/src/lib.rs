//! graft - assemble a custom binary from a base template and plugins
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! # Overview
//!
//! `graft build` takes a base template source tree and a list of plugin
//! modules, regenerates the template's plugin registry and dependency
//! manifest, then runs the toolchain to fetch, normalize and compile.
//!
//! # Configuration
//!
//! Settings come from `graft.toml` (see [`graft_schema::GraftConfig`]),
//! looked up in the current directory unless `--config` or `GRAFT_CONFIG`
//! points elsewhere. Command-line flags override file values.

pub mod cmd;
pub mod config;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "graft")]
#[command(author, version, about = "graft - build a custom binary from a template and plugin modules")]
pub struct Cli {
    /// Path to the configuration file (defaults to ./graft.toml when present)
    #[arg(short, long, global = true, env = "GRAFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Show debug output, including every line of toolchain output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Regenerate the template's plugin files and compile the binary
    Build(BuildArgs),
    /// Print the generated files and toolchain commands without running them
    Plan(BuildArgs),
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct BuildArgs {
    /// Template source tree (overrides [template].path)
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Output binary path; "." means the current directory (overrides [build].output)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Extra plugin list files, appended after the config's [[plugins]]
    #[arg(short, long = "plugins", value_name = "FILE")]
    pub plugin_files: Vec<PathBuf>,

    /// Extra arguments for the compile command (replaces [build].args)
    #[arg(last = true)]
    pub build_args: Vec<String>,
}
