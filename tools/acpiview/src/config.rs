//! Settings resolution: built-in defaults, then the optional TOML file, then
//! command-line flags.

use std::io::IsTerminal;
use std::path::Path;

use acpiview::{ArchCompat, Config};
use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::cli::Cli;

/// Contents of a `--config` file. Every key is optional.
///
/// ```toml
/// consistency-checking = true
/// colour = false
/// arch = "aarch64"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    /// Enables offset, field and structure count validation.
    pub consistency_checking: Option<bool>,
    /// Colours errors, warnings and section headers.
    pub colour: Option<bool>,
    /// Target architecture name.
    pub arch: Option<String>,
}

impl FileConfig {
    /// Reads and parses a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

fn arch_from_name(name: &str) -> Result<ArchCompat> {
    match ArchCompat::from_arch_name(name) {
        Some(arch) => Ok(arch),
        None => bail!("unknown architecture '{name}' (expected ia32, x64, arm or aarch64)"),
    }
}

/// Builds the decoder configuration from `file` and the command line.
///
/// Colour defaults to on when stdout is a terminal.
pub fn merge(file: &FileConfig, cli: &Cli, stdout_is_terminal: bool) -> Result<Config> {
    let mut config = Config {
        highlight: stdout_is_terminal,
        ..Config::default()
    };

    if let Some(consistency) = file.consistency_checking {
        config.consistency_checking = consistency;
    }
    if let Some(colour) = file.colour {
        config.highlight = colour;
    }
    if let Some(name) = &file.arch {
        config.target = arch_from_name(name).context("invalid `arch` in settings file")?;
    }

    if cli.no_consistency {
        config.consistency_checking = false;
    }
    if let Some(colour) = cli.colour_choice() {
        config.highlight = colour;
    }
    if let Some(name) = &cli.arch {
        config.target = arch_from_name(name)?;
    }

    Ok(config)
}

/// Resolves the decoder configuration for this invocation.
pub fn resolve(cli: &Cli) -> Result<Config> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    merge(&file, cli, std::io::stdout().is_terminal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(["acpiview"].iter().chain(args).chain(&["t.bin"]).copied())
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let config = merge(&FileConfig::default(), &cli(&[]), false).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let file = FileConfig::parse(
            "consistency-checking = false\ncolour = true\narch = \"aarch64\"\n",
        )
        .unwrap();
        let config = merge(&file, &cli(&[]), false).unwrap();
        assert!(!config.consistency_checking);
        assert!(config.highlight);
        assert_eq!(config.target, ArchCompat::AARCH64);
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig::parse("colour = true\narch = \"x64\"\n").unwrap();
        let config = merge(&file, &cli(&["--no-colour", "--arch", "arm"]), true).unwrap();
        assert!(!config.highlight);
        assert_eq!(config.target, ArchCompat::ARM);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("color = true\n").is_err());
    }

    #[test]
    fn unknown_arch_in_file_is_rejected() {
        let file = FileConfig::parse("arch = \"mips\"\n").unwrap();
        assert!(merge(&file, &cli(&[]), false).is_err());
    }
}
