//! Command-line interface definitions for acpiview.

use std::path::PathBuf;

use clap::Parser;

/// Dump and validate raw ACPI table images.
#[derive(Parser)]
#[command(name = "acpiview", version, about)]
pub struct Cli {
    /// Raw table images to decode, one table per file.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// TOML file with default settings; flags take precedence.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only decode tables with this 4-character signature.
    #[arg(long, short = 's', value_name = "SIG")]
    pub select: Option<String>,

    /// Hex dump each table before decoding it.
    #[arg(long, short = 'd')]
    pub dump: bool,

    /// Skip offset, field and structure count validation.
    #[arg(long)]
    pub no_consistency: bool,

    /// Colour errors, warnings and section headers.
    #[arg(long, overrides_with = "no_colour")]
    pub colour: bool,

    /// Never colour output.
    #[arg(long, overrides_with = "colour")]
    pub no_colour: bool,

    /// Architecture whose structures may appear in the tables.
    #[arg(long, value_parser = ["ia32", "x64", "arm", "aarch64"])]
    pub arch: Option<String>,

    /// Suppress diagnostics; show only table output and the summary.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose diagnostics with per-table timings.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// The colour choice made on the command line, if any.
    pub fn colour_choice(&self) -> Option<bool> {
        if self.colour {
            Some(true)
        } else if self.no_colour {
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn last_colour_flag_wins() {
        let cli = Cli::parse_from(["acpiview", "--colour", "--no-colour", "t.bin"]);
        assert_eq!(cli.colour_choice(), Some(false));
        let cli = Cli::parse_from(["acpiview", "--no-colour", "--colour", "t.bin"]);
        assert_eq!(cli.colour_choice(), Some(true));
        let cli = Cli::parse_from(["acpiview", "t.bin"]);
        assert_eq!(cli.colour_choice(), None);
    }

    #[test]
    fn unknown_arch_is_rejected() {
        assert!(Cli::try_parse_from(["acpiview", "--arch", "riscv64", "t.bin"]).is_err());
    }
}
