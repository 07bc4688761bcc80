//! Command modules - one file per CLI command

pub mod build;
pub mod completions;
pub mod plan;
