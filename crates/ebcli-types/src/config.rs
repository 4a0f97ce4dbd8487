//! User configuration loaded from `config.toml`.
//!
//! Every field is optional in the file. Command-line flags override whatever
//! the file provides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EbError, Result};

/// Target used when neither the command line nor the config names one.
pub const DEFAULT_TARGET: &str = "192.168.1.50:1234";

/// Default number of REPL history entries kept on disk.
pub const DEFAULT_HISTORY_LENGTH: usize = 1000;

/// Default UDP reply timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

const HISTORY_FILE_NAME: &str = ".ebcli_history";

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Device address as `host[:port]`.
    pub target: String,
    /// CSR map loaded at startup.
    pub csr: Option<PathBuf>,
    /// REPL history file. `~` is expanded.
    pub history_file: Option<PathBuf>,
    /// Maximum number of history entries.
    pub history_length: usize,
    /// How long to wait for a read reply before failing.
    pub timeout_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            csr: None,
            history_file: None,
            history_length: DEFAULT_HISTORY_LENGTH,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl CliConfig {
    /// Parse a config file's contents.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: CliConfig = toml::from_str(toml_str)?;
        if config.history_length == 0 {
            return Err(EbError::Config("history_length must be at least 1".into()));
        }
        Ok(config)
    }

    /// Load the config.
    ///
    /// An explicit `path` must exist. Without one, the per-user default
    /// location is used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.is_file() => p,
                _ => return Ok(Self::default()),
            },
        };
        log::debug!("loading config from {}", path.display());
        let text = std::fs::read_to_string(&path)
            .map_err(|e| EbError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Resolved history file location.
    pub fn history_path(&self) -> PathBuf {
        match &self.history_file {
            Some(p) => expand_tilde(&p.to_string_lossy()),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(HISTORY_FILE_NAME),
        }
    }
}

/// `<config_dir>/ebcli/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ebcli").join("config.toml"))
}

/// Replace a leading `~` with the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
