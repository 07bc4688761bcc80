//! Plan command

use anyhow::{Context, Result};
use graft_core::{BuildPlan, BuildRequest, Builder, ProcessToolchain, TracingReporter};

/// Render the artifacts and list the commands without running anything.
pub fn plan(request: &BuildRequest) -> Result<()> {
    let plan = Builder::new(&ProcessToolchain, &TracingReporter)
        .plan(request)
        .context("Failed to plan build")?;
    print_plan(request, &plan);
    Ok(())
}

/// Print `plan` in the order the build would act on it.
pub fn print_plan(request: &BuildRequest, plan: &BuildPlan) {
    let root = request.root.display();

    println!("# {root}/{}", request.layout.registry.display());
    print!("{}", plan.registry);
    println!();
    println!("# {root}/{}", request.layout.manifest.display());
    print!("{}", plan.manifest);
    println!();
    println!("# commands (in {root})");
    for invocation in &plan.invocations {
        println!("[{}] {invocation}", invocation.stage);
    }
    println!();
    println!("# output: {}", plan.output.display());
}
