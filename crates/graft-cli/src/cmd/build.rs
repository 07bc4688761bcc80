//! Build command

use anyhow::{Context, Result};
use graft_core::{BuildRequest, Builder, ProcessToolchain, TracingReporter};

/// Run the full pipeline, or only plan it when `dry_run` is set.
pub fn build(request: &BuildRequest, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("Dry run: the template tree is left untouched.");
        return super::plan::plan(request);
    }

    tracing::info!(
        root = %request.root.display(),
        plugins = request.modules.len(),
        "building"
    );
    let output = Builder::new(&ProcessToolchain, &TracingReporter)
        .build(request)
        .context("Build failed")?;
    println!("Built {}", output.display());
    Ok(())
}
