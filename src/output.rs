//! JSON reports for `--json` mode.

use serde::Serialize;
use std::path::Path;

use crate::archiver::LogOutcome;
use crate::config::Settings;

#[derive(Serialize)]
struct LogRecord<'a> {
    /// Entry content as emitted (after any truncation)
    entry: &'a str,
    #[serde(flatten)]
    outcome: &'a LogOutcome,
}

#[derive(Serialize)]
struct BackupRecord<'a> {
    archive: &'a str,
    artifact: String,
}

#[derive(Serialize)]
struct LogReport<'a> {
    command: &'static str,
    #[serde(flatten)]
    log: LogRecord<'a>,
}

#[derive(Serialize)]
struct BackupReport<'a> {
    command: &'static str,
    #[serde(flatten)]
    backup: BackupRecord<'a>,
}

/// The no-subcommand run: one document for both steps.
#[derive(Serialize)]
struct DefaultReport<'a> {
    command: &'static str,
    log: LogRecord<'a>,
    backup: BackupRecord<'a>,
}

#[derive(Serialize)]
struct SessionReport<'a> {
    command: &'static str,
    session_id: &'a str,
}

#[derive(Serialize)]
struct VerifyReport {
    command: &'static str,
    valid: bool,
}

#[derive(Serialize)]
struct SecretReport {
    name: &'static str,
    available: bool,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    command: &'static str,
    max_entry_len: usize,
    max_name_len: usize,
    overflow: &'static str,
    archive_tool: &'a str,
    backup_dir: String,
    source_dir: String,
    archive_host: &'a str,
    secret_sources: &'a str,
    secrets: Vec<SecretReport>,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn backup_record<'a>(archive: &'a str, artifact: &Path) -> BackupRecord<'a> {
    BackupRecord {
        archive,
        artifact: artifact.display().to_string(),
    }
}

pub(crate) fn log_json(entry: &str, outcome: &LogOutcome) -> String {
    to_json(&LogReport {
        command: "log",
        log: LogRecord { entry, outcome },
    })
}

pub(crate) fn backup_json(archive: &str, artifact: &Path) -> String {
    to_json(&BackupReport {
        command: "backup",
        backup: backup_record(archive, artifact),
    })
}

pub(crate) fn default_json(
    entry: &str,
    outcome: &LogOutcome,
    archive: &str,
    artifact: &Path,
) -> String {
    to_json(&DefaultReport {
        command: "default",
        log: LogRecord { entry, outcome },
        backup: backup_record(archive, artifact),
    })
}

pub(crate) fn session_json(session_id: &str) -> String {
    to_json(&SessionReport {
        command: "session",
        session_id,
    })
}

pub(crate) fn verify_json(valid: bool) -> String {
    to_json(&VerifyReport {
        command: "verify",
        valid,
    })
}

pub(crate) fn check_json(
    settings: &Settings,
    secret_sources: &str,
    secrets: &[(&'static str, bool)],
) -> String {
    to_json(&CheckReport {
        command: "check",
        max_entry_len: settings.max_entry_len,
        max_name_len: settings.max_name_len,
        overflow: overflow_label(settings),
        archive_tool: &settings.archive_tool,
        backup_dir: settings.backup_dir.display().to_string(),
        source_dir: settings.source_dir.display().to_string(),
        archive_host: &settings.archive_host,
        secret_sources,
        secrets: secrets
            .iter()
            .map(|&(name, available)| SecretReport { name, available })
            .collect(),
    })
}

pub(crate) fn overflow_label(settings: &Settings) -> &'static str {
    match settings.overflow {
        crate::config::OverflowPolicy::Reject => "reject",
        crate::config::OverflowPolicy::Truncate => "truncate",
    }
}
