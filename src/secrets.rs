//! Runtime secret lookup.
//!
//! Credentials and reference values are fetched by name; nothing secret is
//! compiled into the binary.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ArchiveError, Result};

pub(crate) const ENV_PREFIX: &str = "LOGARCHIVER_SECRET_";

/// Name of the reference signature checked by `verify`.
pub(crate) const MASTER_SIGNATURE: &str = "master_signature";
/// Name of the credential for the remote archive host.
pub(crate) const ARCHIVE_CREDENTIAL: &str = "archive_credential";

/// A secret value. `Debug` never prints the contents.
#[derive(Clone)]
pub(crate) struct Secret(String);

impl Secret {
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

pub(crate) trait SecretStore {
    /// Short label for diagnostics ("environment", a file path, ...)
    fn describe(&self) -> String;

    fn lookup(&self, name: &str) -> Option<Secret>;

    fn fetch(&self, name: &str) -> Result<Secret> {
        self.lookup(name).ok_or_else(|| ArchiveError::SecretUnavailable {
            name: name.to_string(),
        })
    }
}

/// Reads `LOGARCHIVER_SECRET_<NAME>` from the process environment.
pub(crate) struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    pub(crate) fn new() -> Self {
        Self {
            prefix: ENV_PREFIX.to_string(),
        }
    }

    pub(crate) fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name.to_ascii_uppercase().replace('-', "_"))
    }
}

impl SecretStore for EnvSecretStore {
    fn describe(&self) -> String {
        format!("environment ({}*)", self.prefix)
    }

    fn lookup(&self, name: &str) -> Option<Secret> {
        std::env::var(self.var_name(name))
            .ok()
            .filter(|v| !v.is_empty())
            .map(Secret::new)
    }
}

/// A TOML file of `name = "value"` pairs.
pub(crate) struct FileSecretStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileSecretStore {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ArchiveError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        warn_if_shared(path);
        let values: HashMap<String, String> =
            toml::from_str(&content).map_err(|e| ArchiveError::Config {
                path: path.to_path_buf(),
                reason: e.to_string().trim().to_string(),
            })?;
        tracing::debug!(path = %path.display(), count = values.len(), "loaded secrets file");
        Ok(Self::from_values(path.to_path_buf(), values))
    }

    pub(crate) fn from_values(path: PathBuf, values: HashMap<String, String>) -> Self {
        Self { path, values }
    }
}

impl SecretStore for FileSecretStore {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn lookup(&self, name: &str) -> Option<Secret> {
        self.values
            .get(name)
            .filter(|v| !v.is_empty())
            .map(|v| Secret::new(v.as_str()))
    }
}

#[cfg(unix)]
fn warn_if_shared(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = fs::metadata(path)
        && meta.permissions().mode() & 0o077 != 0
    {
        tracing::warn!(
            path = %path.display(),
            mode = %format!("{:o}", meta.permissions().mode() & 0o777),
            "secrets file is readable by other users"
        );
    }
}

#[cfg(not(unix))]
fn warn_if_shared(_path: &Path) {}

/// Tries each store in order; first hit wins.
#[derive(Default)]
pub(crate) struct ChainedSecretStore {
    stores: Vec<Box<dyn SecretStore>>,
}

impl ChainedSecretStore {
    pub(crate) fn with(mut self, store: impl SecretStore + 'static) -> Self {
        self.stores.push(Box::new(store));
        self
    }

    /// Environment first, then the configured secrets file if any.
    pub(crate) fn standard(secrets_file: Option<&Path>) -> Result<Self> {
        let chain = Self::default().with(EnvSecretStore::new());
        match secrets_file {
            Some(path) => Ok(chain.with(FileSecretStore::open(path)?)),
            None => Ok(chain),
        }
    }
}

impl SecretStore for ChainedSecretStore {
    fn describe(&self) -> String {
        self.stores
            .iter()
            .map(|s| s.describe())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn lookup(&self, name: &str) -> Option<Secret> {
        let found = self.stores.iter().find_map(|s| s.lookup(name));
        if found.is_none() {
            tracing::debug!(name, "secret not found in any store");
        }
        found
    }
}
