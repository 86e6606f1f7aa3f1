//! Configuration management for LazyRedmine.
//!
//! This module handles loading and saving the user configuration file,
//! which holds the Redmine server profile and application settings.

mod profile;
mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub use profile::ServerProfile;
pub use settings::{Scope, Settings};

/// Name of the application directory under the platform config dir.
const APP_DIR: &str = "lazyredmine";

/// Name of the configuration file.
const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found at {0}; run `lazyredmine setup --url <URL> --api-key <KEY>` first")]
    NotFound(PathBuf),

    /// The platform has no config directory.
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    /// Reading or writing the file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serializing the configuration failed.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value in the file is invalid.
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The complete configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Connection details for the Redmine server.
    pub server: ServerProfile,
    /// Application behavior settings.
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load and validate the configuration at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;

        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.settings.validate()
    }
}
