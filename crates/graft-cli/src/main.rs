//! graft - assemble a custom binary from a base template and plugin modules

use anyhow::Result;
use clap::Parser;
use graft_cli::{Cli, Commands, cmd, config};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build(args) => {
            let settings = config::load(cli.config.as_deref())?;
            let request = config::build_request(settings, &args)?;
            cmd::build::build(&request, cli.dry_run)
        }
        Commands::Plan(args) => {
            let settings = config::load(cli.config.as_deref())?;
            let request = config::build_request(settings, &args)?;
            cmd::plan::plan(&request)
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
