//! Core library for graft.
//!
//! Turns an ordered list of plugin [`ModuleDescriptor`]s into a generated
//! registration source file and dependency manifest inside a base template
//! tree, then drives the toolchain through dependency resolution, two
//! manifest normalization passes and the final compile.
//!
//! The pipeline never changes the process working directory; every child
//! process is started with the template root as its working directory.

pub mod alias;
pub mod builder;
pub mod entry;
pub mod error;
pub mod provider;
pub mod render;
pub mod reporter;
pub mod stage;
pub mod toolchain;

pub use alias::AliasGenerator;
pub use builder::{BuildPlan, BuildRequest, Builder};
pub use entry::{Entry, Template};
pub use error::BuildError;
pub use graft_schema::{ModuleDescriptor, ModuleName, ToolchainConfig, TreeLayout};
pub use provider::{FileProvider, ModuleProvider, StaticProvider, collect_modules};
pub use reporter::{NullReporter, Reporter, TracingReporter};
pub use stage::Stage;
pub use toolchain::{Invocation, ProcessToolchain, Toolchain};
