//! `geomap completions <shell>`
//!
//! Emits a completion script covering the nested `region`, `event` and
//! `list` subcommands along with the global `--json`, `--config` and
//! `--quiet` flags.
//!
//! ```text
//! geomap completions zsh > ~/.zfunc/_geomap
//! ```

use std::io::{self, Write};

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

use super::CommandContext;

#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub async fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        write_completions(self.shell, &mut io::stdout());
        Ok(())
    }
}

fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = crate::Cli::command();
    clap_complete::generate(shell, &mut cmd, "geomap", out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_script_lists_nested_subcommands() {
        let mut out = Vec::new();
        write_completions(Shell::Bash, &mut out);
        let script = String::from_utf8(out).unwrap();

        assert!(script.contains("_geomap()"));
        for word in ["region", "event", "list", "foreground", "--json"] {
            assert!(script.contains(word), "missing {word}");
        }
    }
}
