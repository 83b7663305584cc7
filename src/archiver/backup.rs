//! Shell-free archive tool invocation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::Utc;

use crate::error::{ArchiveError, Result};

const ARCHIVE_FLAGS: &str = "-czf";
const ARCHIVE_EXT: &str = "tar.gz";

// Limits on how much of a failing tool's stderr ends up in the error.
const STDERR_MAX_LINES: usize = 20;
const STDERR_MAX_BYTES: usize = 2048;

fn is_allowed(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// An archive name that passed the allow-list check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArchiveName(String);

impl ArchiveName {
    pub(crate) fn parse(name: &str, max_len: usize) -> Result<Self> {
        if name.len() > max_len {
            return Err(ArchiveError::InputTooLong {
                what: "archive name",
                len: name.len(),
                max: max_len,
            });
        }
        if name.is_empty() {
            return Err(ArchiveError::InvalidName {
                name: String::new(),
                reason: "name cannot be empty",
            });
        }
        if !name.bytes().all(is_allowed) {
            return Err(ArchiveError::InvalidName {
                name: name.to_string(),
                reason: "only letters, digits, '-' and '_' are allowed",
            });
        }
        Ok(Self(name.to_string()))
    }

    /// `logs-YYYYMMDD-HHMMSS` in UTC
    pub(crate) fn timestamped() -> Self {
        Self(format!("logs-{}", Utc::now().format("%Y%m%d-%H%M%S")))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// A fully formed process launch: program plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    pub(crate) program: String,
    pub(crate) args: Vec<OsString>,
}

impl Invocation {
    /// `[program, args...]`
    pub(crate) fn argv(&self) -> Vec<OsString> {
        std::iter::once(OsString::from(&self.program))
            .chain(self.args.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunOutput {
    pub(crate) success: bool,
    pub(crate) status: String,
    pub(crate) stderr: String,
}

/// Launches external programs. Implementations must not involve a shell.
pub(crate) trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<RunOutput>;
}

/// Spawns the program directly with [`std::process::Command`].
pub(crate) struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<RunOutput> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ArchiveError::ToolNotFound {
                        tool: invocation.program.clone(),
                    }
                } else {
                    ArchiveError::Spawn {
                        tool: invocation.program.clone(),
                        source: e,
                    }
                }
            })?;

        Ok(RunOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

pub(crate) fn archive_path(backup_dir: &Path, name: &ArchiveName) -> PathBuf {
    backup_dir.join(format!("{}.{ARCHIVE_EXT}", name.as_str()))
}

pub(crate) fn build_invocation(
    tool: &str,
    backup_dir: &Path,
    source_dir: &Path,
    name: &ArchiveName,
) -> Invocation {
    Invocation {
        program: tool.to_string(),
        args: vec![
            OsString::from(ARCHIVE_FLAGS),
            archive_path(backup_dir, name).into_os_string(),
            source_dir.as_os_str().to_os_string(),
        ],
    }
}

/// The last lines of `stderr`, at most `STDERR_MAX_LINES` lines and
/// `STDERR_MAX_BYTES` bytes. A cut is marked with a leading `...`.
fn stderr_tail(stderr: &str) -> String {
    let stderr = stderr.trim();
    let mut start = stderr
        .rmatch_indices('\n')
        .nth(STDERR_MAX_LINES - 1)
        .map_or(0, |(i, _)| i + 1);
    if stderr.len() - start > STDERR_MAX_BYTES {
        start = stderr.len() - STDERR_MAX_BYTES;
        while !stderr.is_char_boundary(start) {
            start += 1;
        }
    }
    if start == 0 {
        stderr.to_string()
    } else {
        format!("...{}", &stderr[start..])
    }
}

/// Run the archive tool and map a non-zero exit to an error.
pub(crate) fn execute(runner: &dyn CommandRunner, invocation: &Invocation) -> Result<()> {
    tracing::info!(tool = %invocation.program, argv = ?invocation.argv(), "running archive tool");
    let output = runner.run(invocation)?;
    if output.success {
        return Ok(());
    }
    tracing::debug!(status = %output.status, stderr_len = output.stderr.len(), "archive tool failed");
    Err(ArchiveError::ExternalProcessFailed {
        tool: invocation.program.clone(),
        status: output.status,
        stderr: stderr_tail(&output.stderr),
    })
}
