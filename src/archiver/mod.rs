//! The archiver: log intake, backups, session ids and signature checks.
//!
//! Each operation is stateless and single-shot. External effects go through
//! the [`CommandRunner`] and [`SecretStore`] seams.

mod backup;
mod log;
mod session;
mod signature;

use std::io::Write;
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::Result;
use crate::secrets::{ARCHIVE_CREDENTIAL, Secret, SecretStore};

pub(crate) use backup::{ArchiveName, CommandRunner, SystemRunner};
pub(crate) use log::LogOutcome;

#[cfg(test)]
pub(crate) use backup::testing::RecordingRunner;

/// Remote archive location and its credential
#[derive(Debug)]
pub(crate) struct ArchiveTarget {
    pub(crate) host: String,
    pub(crate) credential: Secret,
}

pub(crate) struct LogArchiver<'a> {
    settings: &'a Settings,
    runner: &'a dyn CommandRunner,
    secrets: &'a dyn SecretStore,
}

impl<'a> LogArchiver<'a> {
    pub(crate) fn new(
        settings: &'a Settings,
        runner: &'a dyn CommandRunner,
        secrets: &'a dyn SecretStore,
    ) -> Self {
        Self {
            settings,
            runner,
            secrets,
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        self.settings
    }

    pub(crate) fn process_log(&self, entry: &str, out: &mut dyn Write) -> Result<LogOutcome> {
        log::process_log(
            entry,
            self.settings.max_entry_len,
            self.settings.overflow,
            out,
        )
    }

    /// Validate `archive_name`, then archive the source dir. Returns the artifact path.
    pub(crate) fn backup_logs(&self, archive_name: &str) -> Result<PathBuf> {
        let name = ArchiveName::parse(archive_name, self.settings.max_name_len)?;
        self.backup_as(&name)
    }

    pub(crate) fn backup_as(&self, name: &ArchiveName) -> Result<PathBuf> {
        let invocation = backup::build_invocation(
            &self.settings.archive_tool,
            &self.settings.backup_dir,
            &self.settings.source_dir,
            name,
        );
        backup::execute(self.runner, &invocation)?;
        let artifact = backup::archive_path(&self.settings.backup_dir, name);
        tracing::info!(artifact = %artifact.display(), "backup complete");
        Ok(artifact)
    }

    pub(crate) fn generate_session_id(&self) -> Result<String> {
        session::generate_session_id()
    }

    pub(crate) fn validate_signature(&self, hash: &str) -> Result<bool> {
        signature::validate_signature(self.secrets, hash)
    }

    pub(crate) fn archive_target(&self) -> Result<ArchiveTarget> {
        Ok(ArchiveTarget {
            host: self.settings.archive_host.clone(),
            credential: self.secrets.fetch(ARCHIVE_CREDENTIAL)?,
        })
    }

    /// Names of the secrets the archiver can use, with availability.
    pub(crate) fn secret_status(&self) -> Vec<(&'static str, bool)> {
        [crate::secrets::MASTER_SIGNATURE, ARCHIVE_CREDENTIAL]
            .into_iter()
            .map(|name| (name, self.secrets.lookup(name).is_some()))
            .collect()
    }

    pub(crate) fn describe_secrets(&self) -> String {
        self.secrets.describe()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::ffi::OsString;

    use super::*;
    use crate::config::OverflowPolicy;
    use crate::error::ArchiveError;
    use crate::secrets::{FileSecretStore, MASTER_SIGNATURE};

    fn secrets(pairs: &[(&str, &str)]) -> FileSecretStore {
        FileSecretStore::from_values(
            PathBuf::from("secrets.toml"),
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn backup_daily_invokes_tar_with_argv() {
        let settings = Settings::default();
        let runner = RecordingRunner::succeeding();
        let store = secrets(&[]);
        let archiver = LogArchiver::new(&settings, &runner, &store);

        let artifact = archiver.backup_logs("daily_backup").unwrap();
        assert_eq!(artifact, PathBuf::from("/backups/daily_backup.tar.gz"));

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        let expected: Vec<OsString> = ["tar", "-czf", "/backups/daily_backup.tar.gz", "/var/logs/"]
            .iter()
            .map(OsString::from)
            .collect();
        assert_eq!(calls[0].argv(), expected);
    }

    #[test]
    fn invalid_name_never_reaches_runner() {
        let settings = Settings::default();
        let runner = RecordingRunner::succeeding();
        let store = secrets(&[]);
        let archiver = LogArchiver::new(&settings, &runner, &store);

        let err = archiver.backup_logs("; rm -rf /").unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidName { .. }));
        let err = archiver.backup_logs(&"x".repeat(500)).unwrap_err();
        assert!(matches!(err, ArchiveError::InputTooLong { .. }));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn failing_tool_surfaces_error() {
        let settings = Settings::default();
        let runner = RecordingRunner::failing();
        let store = secrets(&[]);
        let archiver = LogArchiver::new(&settings, &runner, &store);

        assert!(matches!(
            archiver.backup_logs("daily_backup"),
            Err(ArchiveError::ExternalProcessFailed { .. })
        ));
    }

    #[test]
    fn process_log_uses_configured_policy() {
        let settings = Settings {
            max_entry_len: 4,
            overflow: OverflowPolicy::Truncate,
            ..Settings::default()
        };
        let runner = RecordingRunner::succeeding();
        let store = secrets(&[]);
        let archiver = LogArchiver::new(&settings, &runner, &store);

        let mut out = Vec::new();
        let outcome = archiver.process_log("abcdef", &mut out).unwrap();
        assert!(outcome.truncated);
        assert_eq!(out, b"Processing entry: abcd\n");
    }

    #[test]
    fn validate_signature_reads_store() {
        let settings = Settings::default();
        let runner = RecordingRunner::succeeding();
        let store = secrets(&[(MASTER_SIGNATURE, "cafe")]);
        let archiver = LogArchiver::new(&settings, &runner, &store);

        assert!(archiver.validate_signature("cafe").unwrap());
        assert!(!archiver.validate_signature("CAFE").unwrap());
    }

    #[test]
    fn archive_target_fetches_credential_by_name() {
        let settings = Settings::default();
        let runner = RecordingRunner::succeeding();
        let store = secrets(&[(ARCHIVE_CREDENTIAL, "user:pass")]);
        let archiver = LogArchiver::new(&settings, &runner, &store);

        let target = archiver.archive_target().unwrap();
        assert_eq!(target.host, "archive-cluster-01.internal");
        assert_eq!(target.credential.expose(), "user:pass");
        assert!(!format!("{target:?}").contains("user:pass"));
    }

    #[test]
    fn secret_status_reports_availability_only() {
        let settings = Settings::default();
        let runner = RecordingRunner::succeeding();
        let store = secrets(&[(MASTER_SIGNATURE, "abc")]);
        let archiver = LogArchiver::new(&settings, &runner, &store);

        assert_eq!(
            archiver.secret_status(),
            vec![(MASTER_SIGNATURE, true), (ARCHIVE_CREDENTIAL, false)]
        );
    }
}
