//! Command-line interface for the `calcscript` demonstration binary.
//!
//! This module is a host of the library (§11.3 of `SPEC_FULL.md`), not
//! part of the embeddable core; it mirrors the reference repository's
//! own `cli::Cli`/`cli::Config` split (`src/bin/cli.rs`).

use clap::Parser as ClapParser;

/// Command-line arguments for `calcscript`.
#[derive(ClapParser, Debug)]
#[command(name = "calcscript")]
#[command(about = "An embeddable floating point expression evaluator", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Evaluate one expression (semicolon-separated for multiple) and exit.
    #[arg(short = 'e', long = "execute", conflicts_with = "script")]
    pub execute: Option<String>,

    /// Evaluate each line of a script file in one running session.
    #[arg(short = 's', long = "script", conflicts_with = "execute")]
    pub script: Option<String>,

    /// Suppress the startup banner (interactive mode only).
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Disable color output.
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Disable domain-error checking for math intrinsics
    /// (`sqrt`, `log`, `asin`, ...), matching the reference's
    /// `MUP_MATH_EXCEPTIONS`-off build.
    #[arg(long = "no-domain-checks")]
    pub no_domain_checks: bool,
}

/// Execution mode derived from CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Interactive,
    Execute,
    Script,
}

impl Cli {
    pub fn execution_mode(&self) -> ExecutionMode {
        if self.execute.is_some() {
            ExecutionMode::Execute
        } else if self.script.is_some() {
            ExecutionMode::Script
        } else {
            ExecutionMode::Interactive
        }
    }
}

/// Splits a command string by semicolons into individual expressions,
/// trimming whitespace and filtering empty entries.
pub fn split_commands(input: &str) -> Vec<&str> {
    input
        .split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn should_show_banner(mode: ExecutionMode, quiet: bool) -> bool {
    mode == ExecutionMode::Interactive && !quiet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_semicolon_commands() {
        assert_eq!(split_commands(" a=1 ; b=2; ;c=3"), vec!["a=1", "b=2", "c=3"]);
    }

    #[test]
    fn banner_only_in_quiet_interactive_mode() {
        assert!(should_show_banner(ExecutionMode::Interactive, false));
        assert!(!should_show_banner(ExecutionMode::Interactive, true));
        assert!(!should_show_banner(ExecutionMode::Execute, false));
    }
}
