use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::archiver::{ArchiveName, LogArchiver, LogOutcome};
use crate::cli::{Action, DEFAULT_ARCHIVE, STARTUP_ENTRY};
use crate::error::{ArchiveError, Result};
use crate::output;

pub(crate) struct CommandContext<'a, 'w> {
    pub(crate) archiver: &'a LogArchiver<'a>,
    pub(crate) json: bool,
    pub(crate) out: &'w mut dyn Write,
}

/// Run `process_log`. Under `--json` the entry line is not written raw;
/// it goes into the report instead.
fn log_entry<'e>(
    entry: &'e str,
    ctx: &mut CommandContext<'_, '_>,
) -> Result<(&'e str, LogOutcome)> {
    let outcome = if ctx.json {
        ctx.archiver.process_log(entry, &mut std::io::sink())?
    } else {
        ctx.archiver.process_log(entry, ctx.out)?
    };
    // `written` is always a char-boundary prefix length of `entry`.
    Ok((&entry[..outcome.written], outcome))
}

fn run_backup(name: Option<&str>, ctx: &CommandContext<'_, '_>) -> Result<(String, PathBuf)> {
    match name {
        Some(n) => Ok((n.to_string(), ctx.archiver.backup_logs(n)?)),
        None => {
            let generated = ArchiveName::timestamped();
            let artifact = ctx.archiver.backup_as(&generated)?;
            Ok((generated.as_str().to_string(), artifact))
        }
    }
}

fn handle_log(entry: &str, ctx: &mut CommandContext<'_, '_>) -> Result<ExitCode> {
    let (emitted, outcome) = log_entry(entry, ctx)?;
    if ctx.json {
        writeln!(ctx.out, "{}", output::log_json(emitted, &outcome))?;
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_backup(name: Option<&str>, ctx: &mut CommandContext<'_, '_>) -> Result<ExitCode> {
    let (name, artifact) = run_backup(name, ctx)?;
    if ctx.json {
        writeln!(ctx.out, "{}", output::backup_json(&name, &artifact))?;
    } else {
        writeln!(ctx.out, "Backup {name} written to {}", artifact.display())?;
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_session(ctx: &mut CommandContext<'_, '_>) -> Result<ExitCode> {
    let id = ctx.archiver.generate_session_id()?;
    if ctx.json {
        writeln!(ctx.out, "{}", output::session_json(&id))?;
    } else {
        writeln!(ctx.out, "{id}")?;
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_verify(signature: &str, ctx: &mut CommandContext<'_, '_>) -> Result<ExitCode> {
    let valid = ctx.archiver.validate_signature(signature)?;
    if ctx.json {
        writeln!(ctx.out, "{}", output::verify_json(valid))?;
    } else if valid {
        writeln!(ctx.out, "Signature valid.")?;
    } else {
        writeln!(ctx.out, "Signature invalid.")?;
    }
    Ok(if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn handle_check(ctx: &mut CommandContext<'_, '_>) -> Result<ExitCode> {
    let settings = ctx.archiver.settings();
    let secrets = ctx.archiver.secret_status();
    let sources = ctx.archiver.describe_secrets();

    if ctx.json {
        writeln!(ctx.out, "{}", output::check_json(settings, &sources, &secrets))?;
        return Ok(ExitCode::SUCCESS);
    }

    writeln!(ctx.out, "max entry length: {} bytes", settings.max_entry_len)?;
    writeln!(ctx.out, "max name length:  {} bytes", settings.max_name_len)?;
    writeln!(ctx.out, "overflow policy:  {}", output::overflow_label(settings))?;
    writeln!(ctx.out, "archive tool:     {}", settings.archive_tool)?;
    writeln!(ctx.out, "backup dir:       {}", settings.backup_dir.display())?;
    writeln!(ctx.out, "source dir:       {}", settings.source_dir.display())?;
    match ctx.archiver.archive_target() {
        Ok(target) => {
            tracing::debug!(host = %target.host, credential = ?target.credential, "archive target resolved");
            writeln!(ctx.out, "archive host:     {} (credential set)", target.host)?
        }
        Err(ArchiveError::SecretUnavailable { .. }) => writeln!(
            ctx.out,
            "archive host:     {} (no credential)",
            settings.archive_host
        )?,
        Err(e) => return Err(e),
    }
    writeln!(ctx.out, "secret sources:   {sources}")?;
    for (name, available) in secrets {
        let state = if available { "available" } else { "missing" };
        writeln!(ctx.out, "  {name}: {state}")?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Log the startup entry, then back up `daily_backup`.
fn handle_default(ctx: &mut CommandContext<'_, '_>) -> Result<ExitCode> {
    if !ctx.json {
        handle_log(STARTUP_ENTRY, ctx)?;
        return handle_backup(Some(DEFAULT_ARCHIVE), ctx);
    }
    let (emitted, outcome) = log_entry(STARTUP_ENTRY, ctx)?;
    let (name, artifact) = run_backup(Some(DEFAULT_ARCHIVE), ctx)?;
    writeln!(
        ctx.out,
        "{}",
        output::default_json(emitted, &outcome, &name, &artifact)
    )?;
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn handle_action(action: &Action, ctx: &mut CommandContext<'_, '_>) -> Result<ExitCode> {
    tracing::debug!(?action, "dispatching");
    match action {
        Action::Default => handle_default(ctx),
        Action::Log(entry) => handle_log(entry, ctx),
        Action::Backup(name) => handle_backup(name.as_deref(), ctx),
        Action::Session => handle_session(ctx),
        Action::Verify(signature) => handle_verify(signature, ctx),
        Action::Check => handle_check(ctx),
    }
}
