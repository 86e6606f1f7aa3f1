//! Redmine server profile configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// Connection details for a Redmine instance.
///
/// The API key may be omitted here and kept in the OS keyring instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerProfile {
    /// The Redmine base URL (e.g., "https://redmine.example.com").
    pub url: String,

    /// The user's REST API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ServerProfile {
    /// Create a new profile.
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
        }
    }

    /// Validate this profile.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` if the URL is empty or does
    /// not use an http(s) scheme, or if the API key is present but blank.
    pub fn validate(&self) -> Result<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::ValidationError(
                "server URL cannot be empty".to_string(),
            ));
        }

        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "server URL '{}' must start with http:// or https://",
                url
            )));
        }

        if matches!(&self.api_key, Some(key) if key.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "api_key is present but empty; remove it to use the keyring".to_string(),
            ));
        }

        Ok(())
    }
}
