//! Completions command

use clap::CommandFactory;
use clap_complete::{Shell, generate};

/// Write completions for `shell` to stdout, named after the binary.
pub fn completions(shell: Shell) {
    let mut cmd = crate::Cli::command();
    let bin = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin, &mut std::io::stdout().lock());
}
