//! Redmine API client and types.
//!
//! This module provides the interface for communicating with the Redmine REST API.

pub mod auth;
mod client;
pub mod error;
pub mod types;

pub use auth::Auth;
pub use client::RedmineClient;
pub use types::{Issue, IssueQuery, IssueUpdate};
