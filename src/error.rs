//! Process-level errors and the text shown when lazyredmine exits on one.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;

/// The main application error type.
///
/// Aggregates the per-layer errors while keeping the underlying error
/// available for the log file.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// IO errors (file system, terminal).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No API key could be found in any source.
    #[error("no API key configured")]
    MissingApiKey,
}

impl AppError {
    /// Message printed to stderr after the terminal is restored.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NotFound(path) => format!(
                    "No configuration found at {}. Run 'lazyredmine setup' first.",
                    path.display()
                ),
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::Io { path, .. } => {
                    format!("Could not access {}. Check file permissions.", path.display())
                }
                ConfigError::Parse(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::Serialize(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
            },
            AppError::Api(e) => match e {
                ApiError::Unauthorized => {
                    "Authentication failed. Please check your Redmine API key.".to_string()
                }
                ApiError::Forbidden => {
                    "Access denied. You don't have permission to access this resource.".to_string()
                }
                ApiError::NotFound(resource) => format!("'{}' was not found.", resource),
                ApiError::Validation(msg) => format!("Redmine rejected the change: {}", msg),
                ApiError::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServerError(_) => {
                    "Redmine server error. Please try again later.".to_string()
                }
                ApiError::Network(_) => {
                    "Connection failed. Please check your network and server URL.".to_string()
                }
                ApiError::Keyring(_) => {
                    "Could not access secure storage. Run 'lazyredmine setup' again.".to_string()
                }
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from Redmine. Please try again.".to_string()
                }
                ApiError::Conflict => {
                    "This issue was modified by someone else. Please refresh and try again."
                        .to_string()
                }
            },
            AppError::Io(_) => "A file or terminal operation failed.".to_string(),
            AppError::MissingApiKey => {
                "No API key found. Pass --api-key, set REDMINE_API_KEY, or run 'lazyredmine setup'."
                    .to_string()
            }
        }
    }

    /// Whether retrying later (or pressing `r`) can succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Api(ApiError::RateLimited)
                | AppError::Api(ApiError::ServerError(_))
                | AppError::Api(ApiError::Network(_))
                | AppError::Api(ApiError::NotFound(_))
                | AppError::Api(ApiError::Validation(_))
                | AppError::Api(ApiError::Conflict)
        )
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::NotFound(_)) | AppError::MissingApiKey => {
                Some("lazyredmine setup --url <URL> --api-key <KEY>")
            }
            AppError::Api(ApiError::Unauthorized) => {
                Some("Find your API key under 'My account' in the Redmine web UI.")
            }
            AppError::Api(ApiError::RateLimited) => {
                Some("Wait a few seconds and press 'r' to refresh.")
            }
            AppError::Api(ApiError::Network(_)) => {
                Some("Check your network connection and the server URL.")
            }
            _ => None,
        }
    }
}
