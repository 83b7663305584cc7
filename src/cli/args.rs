//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, OverflowPolicy, Settings};

use super::commands::Commands;

#[derive(Debug, Parser)]
#[command(name = "logarchiver")]
#[command(about = "Hardened log intake and archiving", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Config file (default: search ~/.config/logarchiver/config.toml and friends)
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    /// Maximum log entry length in bytes
    #[arg(long, global = true, value_name = "BYTES")]
    pub(crate) max_entry_len: Option<usize>,

    /// Truncate oversized log entries instead of rejecting them
    #[arg(long, global = true)]
    pub(crate) truncate: bool,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        if !self.json && config.json {
            self.json = true;
        }
        if !self.debug && config.debug {
            self.debug = true;
        }
        self
    }

    /// Settings from the config file with CLI overrides applied
    pub(crate) fn settings(&self, config: &Config) -> Settings {
        let mut settings = Settings::from(config);
        if let Some(max) = self.max_entry_len {
            settings.max_entry_len = max;
        }
        if self.truncate {
            settings.overflow = OverflowPolicy::Truncate;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("logarchiver").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_args_parses() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["log", "hello", "--json", "--max-entry-len", "8", "--truncate"]);
        assert!(matches!(cli.command, Some(Commands::Log { ref entry }) if entry == "hello"));
        assert!(cli.json);
        let settings = cli.settings(&Config::default());
        assert_eq!(settings.max_entry_len, 8);
        assert_eq!(settings.overflow, OverflowPolicy::Truncate);
    }

    #[test]
    fn backup_name_optional() {
        assert!(matches!(
            parse(&["backup"]).command,
            Some(Commands::Backup { name: None })
        ));
        assert!(matches!(
            parse(&["backup", "daily_backup"]).command,
            Some(Commands::Backup { name: Some(ref n) }) if n == "daily_backup"
        ));
    }

    #[test]
    fn config_flags_merge_when_cli_unset() {
        let config = Config {
            json: true,
            debug: true,
            ..Config::default()
        };
        let cli = parse(&["session"]).with_config(&config);
        assert!(cli.json);
        assert!(cli.debug);
    }

    #[test]
    fn cli_max_entry_len_beats_config() {
        let config = Config {
            max_entry_len: Some(100),
            ..Config::default()
        };
        assert_eq!(parse(&[]).settings(&config).max_entry_len, 100);
        assert_eq!(
            parse(&["--max-entry-len", "10"]).settings(&config).max_entry_len,
            10
        );
    }

    #[test]
    fn verify_requires_signature() {
        assert!(Cli::try_parse_from(["logarchiver", "verify"]).is_err());
    }
}
