mod app;
mod archiver;
mod cli;
mod config;
mod error;
mod logging;
mod output;
mod secrets;

use std::process::ExitCode;

use clap::Parser;

use app::{CommandContext, handle_action};
use archiver::{LogArchiver, SystemRunner};
use cli::{Action, Cli};
use config::Config;
use error::Result;
use secrets::ChainedSecretStore;

fn run(cli: Cli, config: &Config) -> Result<ExitCode> {
    let settings = cli.settings(config);
    let secrets = ChainedSecretStore::standard(settings.secrets_file.as_deref())?;
    let runner = SystemRunner;
    let archiver = LogArchiver::new(&settings, &runner, &secrets);

    let json = cli.json;
    let action = Action::from(cli.command);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut ctx = CommandContext {
        archiver: &archiver,
        json,
        out: &mut out,
    };
    handle_action(&action, &mut ctx)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_path) = match cli.config.as_deref() {
        Some(path) => match Config::load_from(path) {
            Ok(config) => (config, Some(path.to_path_buf())),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Config::load(),
    };
    let cli = cli.with_config(&config);

    // The config decides the log level, so its source is logged only now.
    logging::init(cli.debug, config.log_level.as_deref());
    if let Some(path) = &config_path {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    match run(cli, &config) {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
