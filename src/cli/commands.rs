//! CLI subcommand definitions

use clap::Subcommand;

/// Entry processed by the default run
pub(crate) const STARTUP_ENTRY: &str = "System started.";
/// Archive produced by the default run
pub(crate) const DEFAULT_ARCHIVE: &str = "daily_backup";

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Record a log entry
    Log {
        /// Entry text
        entry: String,
    },
    /// Archive the log directory with the archive tool
    Backup {
        /// Archive name (letters, digits, '-' and '_'); defaults to logs-<timestamp>
        name: Option<String>,
    },
    /// Print a new session identifier
    Session,
    /// Check a signature against the master_signature secret
    Verify {
        /// Signature to compare
        signature: String,
    },
    /// Show effective settings and which secrets are available
    Check,
}

/// What a run should do once arguments are parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    /// Log the startup entry then back up `daily_backup`
    Default,
    Log(String),
    Backup(Option<String>),
    Session,
    Verify(String),
    Check,
}

impl From<Option<Commands>> for Action {
    fn from(cmd: Option<Commands>) -> Self {
        match cmd {
            None => Action::Default,
            Some(Commands::Log { entry }) => Action::Log(entry),
            Some(Commands::Backup { name }) => Action::Backup(name),
            Some(Commands::Session) => Action::Session,
            Some(Commands::Verify { signature }) => Action::Verify(signature),
            Some(Commands::Check) => Action::Check,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_command_is_default_run() {
        assert_eq!(Action::from(None), Action::Default);
    }

    #[test]
    fn commands_map_to_actions() {
        assert_eq!(
            Action::from(Some(Commands::Log {
                entry: "hi".to_string()
            })),
            Action::Log("hi".to_string())
        );
        assert_eq!(
            Action::from(Some(Commands::Backup { name: None })),
            Action::Backup(None)
        );
        assert_eq!(Action::from(Some(Commands::Session)), Action::Session);
        assert_eq!(
            Action::from(Some(Commands::Verify {
                signature: "abc".to_string()
            })),
            Action::Verify("abc".to_string())
        );
        assert_eq!(Action::from(Some(Commands::Check)), Action::Check);
    }
}
