//! Local CLI settings.
//!
//! Settings are resolved from four layers, lowest precedence first:
//! built-in defaults, a YAML settings file, `MIRRORCTL_*` environment
//! variables and explicit command-line overrides. `config set` persists
//! the full record back to the per-user settings file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Prefix for environment-variable overrides, e.g. `MIRRORCTL_PEERDB_HOST`.
pub const ENV_PREFIX: &str = "MIRRORCTL_";

const SETTINGS_FILE: &str = "config.yaml";
const USER_SETTINGS_DIR: &str = ".mirrorctl";
const SYSTEM_SETTINGS_DIR: &str = "/etc/mirrorctl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub peerdb_host: String,
    #[serde(default = "default_port")]
    pub peerdb_port: u16,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8112
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            peerdb_host: default_host(),
            peerdb_port: default_port(),
            tls: false,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Values supplied on the command line. `None` leaves the lower layers
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<bool>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Settings {
    /// Loads settings, merging defaults, a settings file, environment
    /// variables and explicit overrides, in ascending precedence.
    ///
    /// A missing settings file is not an error; a malformed one is. When
    /// `file` is given it is used instead of the search path.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut settings = match file {
            Some(path) => Self::from_file(path)?,
            None => match Self::find_file() {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        settings.apply_env(env::vars());
        settings.apply_overrides(overrides);
        Ok(settings)
    }

    /// Reads a settings file. Unknown keys are ignored, absent keys fall
    /// back to the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| CliError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&raw).map_err(|e| CliError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn find_file() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.is_file())
    }

    /// Search order: per-user directory, current directory, system
    /// directory.
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(USER_SETTINGS_DIR).join(SETTINGS_FILE));
        }
        paths.push(PathBuf::from(SETTINGS_FILE));
        paths.push(Path::new(SYSTEM_SETTINGS_DIR).join(SETTINGS_FILE));
        paths
    }

    /// Applies `MIRRORCTL_*` variables from `vars`. Unparsable numeric or
    /// boolean values are ignored with a warning.
    pub fn apply_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "PEERDB_HOST" => self.peerdb_host = value,
                "PEERDB_PORT" => match value.parse() {
                    Ok(port) => self.peerdb_port = port,
                    Err(_) => {
                        tracing::warn!(value = %value, "ignoring unparsable MIRRORCTL_PEERDB_PORT")
                    }
                },
                "TLS" => match parse_bool(&value) {
                    Some(tls) => self.tls = tls,
                    None => tracing::warn!(value = %value, "ignoring unparsable MIRRORCTL_TLS"),
                },
                "USERNAME" => self.username = value,
                "PASSWORD" => self.password = value,
                _ => {}
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(host) = &overrides.host {
            self.peerdb_host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.peerdb_port = port;
        }
        if let Some(tls) = overrides.tls {
            self.tls = tls;
        }
        if let Some(username) = &overrides.username {
            self.username = username.clone();
        }
        if let Some(password) = &overrides.password {
            self.password = password.clone();
        }
    }

    /// `host:port`, consumed by the flow client to build the server URL.
    pub fn address(&self) -> String {
        format!("{}:{}", self.peerdb_host, self.peerdb_port)
    }

    /// The per-user settings path, which `save` always writes to.
    pub fn user_settings_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(USER_SETTINGS_DIR)
            .join(SETTINGS_FILE)
    }

    /// Persists the full settings record to the per-user settings file,
    /// creating the directory when absent.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::user_settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| CliError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let text = serde_yaml::to_string(self).map_err(|e| CliError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, text).map_err(|e| CliError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
