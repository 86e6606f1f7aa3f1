//! Application settings configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::api::types::MAX_PAGE_SIZE;

/// Which issues the list shows when no user filter is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only issues assigned to the current user.
    #[default]
    Mine,
    /// Issues for any assignee.
    All,
}

impl Scope {
    /// The other scope.
    pub fn toggled(self) -> Self {
        match self {
            Scope::Mine => Scope::All,
            Scope::All => Scope::Mine,
        }
    }

    /// Short label for the header.
    pub fn label(self) -> &'static str {
        match self {
            Scope::Mine => "My issues",
            Scope::All => "All issues",
        }
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Number of issues requested per page.
    pub page_size: u32,
    /// Whether to list only open issues.
    pub open_only: bool,
    /// Scope used at startup.
    pub default_scope: Scope,
    /// Event poll interval in milliseconds.
    pub tick_rate_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            open_only: true,
            default_scope: Scope::Mine,
            tick_rate_ms: 100,
        }
    }
}

impl Settings {
    /// Validate value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tick_rate_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
