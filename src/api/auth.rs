//! Authentication handling for the Redmine API.
//!
//! Redmine authenticates REST calls with a per-user API key sent in the
//! `X-Redmine-API-Key` header. Keys can be stored in the OS keyring so they
//! never have to live in the config file.

use super::error::{ApiError, Result};

/// The keyring service name for LazyRedmine API keys.
const KEYRING_SERVICE: &str = "lazyredmine";

/// The header Redmine reads the API key from.
pub const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// Authentication credentials for Redmine.
#[derive(Clone)]
pub struct Auth {
    api_key: String,
}

impl Auth {
    /// Create credentials from an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Create credentials from the OS keyring entry for a server URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be retrieved from the keyring.
    pub fn from_keyring(server_url: &str) -> Result<Self> {
        get_api_key(server_url).map(Self::new)
    }

    /// Get the header value for HTTP requests.
    pub fn header_value(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth").field("api_key", &"<redacted>").finish()
    }
}

/// Store an API key in the OS keyring.
///
/// # Errors
///
/// Returns an error if the key cannot be stored in the keyring.
pub fn store_api_key(server_url: &str, api_key: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, server_url)
        .map_err(|e| ApiError::Keyring(format!("failed to create keyring entry: {}", e)))?;

    entry
        .set_password(api_key)
        .map_err(|e| ApiError::Keyring(format!("failed to store API key: {}", e)))?;

    Ok(())
}

/// Retrieve an API key from the OS keyring.
///
/// # Errors
///
/// Returns an error if the key cannot be retrieved from the keyring.
pub fn get_api_key(server_url: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, server_url)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve API key: {}", e)))
}
