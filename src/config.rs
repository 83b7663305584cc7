use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ArchiveError, Result};

pub(crate) const DEFAULT_MAX_ENTRY_LEN: usize = 255;
pub(crate) const DEFAULT_MAX_NAME_LEN: usize = 64;
pub(crate) const DEFAULT_ARCHIVE_TOOL: &str = "tar";
pub(crate) const DEFAULT_BACKUP_DIR: &str = "/backups";
pub(crate) const DEFAULT_SOURCE_DIR: &str = "/var/logs/";
pub(crate) const DEFAULT_ARCHIVE_HOST: &str = "archive-cluster-01.internal";

const CONFIG_ENV: &str = "LOGARCHIVER_CONFIG";

/// What to do with a log entry longer than `max_entry_len`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OverflowPolicy {
    #[default]
    Reject,
    Truncate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) max_entry_len: Option<usize>,
    #[serde(default)]
    pub(crate) max_name_len: Option<usize>,
    #[serde(default)]
    pub(crate) overflow: Option<OverflowPolicy>,
    #[serde(default)]
    pub(crate) archive_tool: Option<String>,
    #[serde(default)]
    pub(crate) backup_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) source_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) archive_host: Option<String>,
    #[serde(default)]
    pub(crate) secrets_file: Option<PathBuf>,
    #[serde(default)]
    pub(crate) log_level: Option<String>,
    #[serde(default)]
    pub(crate) debug: bool,
    #[serde(default)]
    pub(crate) json: bool,
}

impl Config {
    /// Search the usual locations; a broken file is skipped with a warning.
    /// Also returns the path the config came from, if any.
    pub(crate) fn load() -> (Self, Option<PathBuf>) {
        Self::load_first(&Self::get_config_paths())
    }

    fn load_first(paths: &[PathBuf]) -> (Self, Option<PathBuf>) {
        for path in paths {
            if !path.exists() {
                continue;
            }
            match Self::load_from(path) {
                Ok(config) => return (config, Some(path.clone())),
                Err(e) => eprintln!("Warning: {e}"),
            }
        }

        (Self::default(), None)
    }

    /// Load an explicitly named file. Any failure is an error.
    pub(crate) fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ArchiveError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        toml::from_str::<Config>(content).map_err(|e| ArchiveError::Config {
            path: path.to_path_buf(),
            reason: e.to_string().trim().to_string(),
        })
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Explicit override via environment
        if let Some(p) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            paths.push(PathBuf::from(p));
        }

        // 2. XDG config: ~/.config/logarchiver/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("logarchiver").join("config.toml"));
        }

        // 3. Platform config dir (macOS Application Support)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("logarchiver").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 4. Home directory: ~/.logarchiver.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".logarchiver.toml"));
        }

        paths
    }
}

/// Fully resolved settings the archiver runs with.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) max_entry_len: usize,
    pub(crate) max_name_len: usize,
    pub(crate) overflow: OverflowPolicy,
    pub(crate) archive_tool: String,
    pub(crate) backup_dir: PathBuf,
    pub(crate) source_dir: PathBuf,
    pub(crate) archive_host: String,
    pub(crate) secrets_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_entry_len: DEFAULT_MAX_ENTRY_LEN,
            max_name_len: DEFAULT_MAX_NAME_LEN,
            overflow: OverflowPolicy::Reject,
            archive_tool: DEFAULT_ARCHIVE_TOOL.to_string(),
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            archive_host: DEFAULT_ARCHIVE_HOST.to_string(),
            secrets_file: None,
        }
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        let defaults = Settings::default();
        Self {
            max_entry_len: config.max_entry_len.unwrap_or(defaults.max_entry_len),
            max_name_len: config.max_name_len.unwrap_or(defaults.max_name_len),
            overflow: config.overflow.unwrap_or(defaults.overflow),
            archive_tool: config
                .archive_tool
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(defaults.archive_tool),
            backup_dir: config.backup_dir.clone().unwrap_or(defaults.backup_dir),
            source_dir: config.source_dir.clone().unwrap_or(defaults.source_dir),
            archive_host: config.archive_host.clone().unwrap_or(defaults.archive_host),
            secrets_file: config.secrets_file.clone(),
        }
    }
}
