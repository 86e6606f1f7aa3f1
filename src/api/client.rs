//! Redmine API client implementation.
//!
//! This module provides the main client for interacting with the Redmine
//! REST API. It handles authentication, request/response processing, error
//! handling, and retry logic for reads.

use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::auth::{Auth, API_KEY_HEADER};
use super::error::{ApiError, Result};
use super::types::{
    Issue, IssueEnvelope, IssueQuery, IssueStatus, IssueUpdate, IssuesPage, Priority,
    PrioritiesResponse, Project, ProjectsPage, StatusesResponse, User, UserEnvelope, UsersPage,
    MAX_PAGE_SIZE,
};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Body of `PUT /issues/{id}.json`.
#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    issue: &'a IssueUpdate,
}

/// The Redmine API client.
///
/// Cheap to clone; background tasks each take their own copy.
#[derive(Debug, Clone)]
pub struct RedmineClient {
    /// The HTTP client.
    client: Client,
    /// The base URL for the Redmine instance.
    base_url: String,
    /// Authentication credentials.
    auth: Auth,
}

impl RedmineClient {
    /// Create a new client for a Redmine instance.
    ///
    /// Does not contact the server; the first fetch reports connection problems.
    pub fn new(base_url: &str, auth: Auth) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::Network)?;

        let base_url = normalize_base_url(base_url);
        info!(base_url = %base_url, "Redmine client created");

        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the browser URL of an issue.
    pub fn issue_web_url(&self, id: u64) -> String {
        format!("{}/issues/{}", self.base_url, id)
    }

    /// Fetch a page of issues.
    #[instrument(skip(self))]
    pub async fn fetch_issues(&self, query: &IssueQuery) -> Result<IssuesPage> {
        let url = format!("{}/issues.json?{}", self.base_url, query.to_query_string());
        let page: IssuesPage = self.get(&url).await?;
        debug!(
            "Fetched {} issues (total: {})",
            page.issues.len(),
            page.total_count
        );
        Ok(page)
    }

    /// Fetch a single issue with its change history.
    #[instrument(skip(self))]
    pub async fn fetch_issue(&self, id: u64) -> Result<Issue> {
        let url = format!("{}/issues/{}.json?include=journals", self.base_url, id);
        let envelope: IssueEnvelope = self.get(&url).await.map_err(|e| {
            if matches!(e, ApiError::NotFound(_)) {
                ApiError::NotFound(format!("Issue #{} not found", id))
            } else {
                e
            }
        })?;
        Ok(envelope.issue)
    }

    /// Fetch a page of users. Requires administrator rights on most servers.
    #[instrument(skip(self))]
    pub async fn fetch_users(&self, limit: u32, offset: u32) -> Result<Vec<User>> {
        let url = format!(
            "{}/users.json?limit={}&offset={}",
            self.base_url,
            limit.min(MAX_PAGE_SIZE),
            offset
        );
        let page: UsersPage = self.get(&url).await?;
        Ok(page.users)
    }

    /// Fetch a page of projects.
    #[instrument(skip(self))]
    pub async fn fetch_projects(&self, limit: u32, offset: u32) -> Result<Vec<Project>> {
        let url = format!(
            "{}/projects.json?limit={}&offset={}",
            self.base_url,
            limit.min(MAX_PAGE_SIZE),
            offset
        );
        let page: ProjectsPage = self.get(&url).await?;
        Ok(page.projects)
    }

    /// Fetch all issue statuses.
    #[instrument(skip(self))]
    pub async fn fetch_statuses(&self) -> Result<Vec<IssueStatus>> {
        let url = format!("{}/issue_statuses.json", self.base_url);
        let response: StatusesResponse = self.get(&url).await?;
        Ok(response.issue_statuses)
    }

    /// Fetch all issue priorities.
    #[instrument(skip(self))]
    pub async fn fetch_priorities(&self) -> Result<Vec<Priority>> {
        let url = format!("{}/enumerations/issue_priorities.json", self.base_url);
        let response: PrioritiesResponse = self.get(&url).await?;
        Ok(response.issue_priorities)
    }

    /// Fetch the authenticated user.
    #[instrument(skip(self))]
    pub async fn fetch_current_user(&self) -> Result<User> {
        let url = format!("{}/users/current.json", self.base_url);
        let envelope: UserEnvelope = self.get(&url).await?;
        Ok(envelope.user)
    }

    /// Update several fields of an issue in one request.
    ///
    /// Never retried: a timed-out update may still have been applied.
    #[instrument(skip(self, fields), fields(field_count = fields.len()))]
    pub async fn update_issue(&self, id: u64, fields: &IssueUpdate) -> Result<()> {
        let url = format!("{}/issues/{}.json", self.base_url, id);
        debug!(?fields, "Submitting issue update");

        let response = self
            .client
            .put(&url)
            .header(API_KEY_HEADER, self.auth.header_value())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&UpdateBody { issue: fields })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(issue_id = id, "Issue updated");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(issue_id = id, %status, "Issue update failed");
            Err(error_from_response(status, &url, &body))
        }
    }

    /// Perform a GET request with retry logic for transient failures.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!("Request attempt {}/{}", attempts, MAX_RETRIES);

            match self.execute_get::<T>(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempts < MAX_RETRIES => {
                    let delay = calculate_retry_delay(attempts);
                    warn!(
                        "Request failed (attempt {}), retrying in {}ms: {}",
                        attempts, delay, e
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Execute a single GET request.
    async fn execute_get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.auth.header_value())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        handle_response(response).await
    }
}

/// Check the HTTP response for errors and parse the JSON body.
async fn handle_response<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let url = response.url().to_string();

    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    } else {
        let error_body = response.text().await.unwrap_or_default();
        debug!("Error response body: {}", error_body);
        Err(error_from_response(status, &url, &error_body))
    }
}

/// Create an appropriate error from an HTTP response.
///
/// Redmine reports validation problems as `{"errors": ["...", "..."]}`.
fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(errors) = json.get("errors").and_then(|e| e.as_array()) {
            let messages: Vec<&str> = errors.iter().filter_map(|v| v.as_str()).collect();
            if !messages.is_empty() {
                return ApiError::from_status(status, &messages.join(", "));
            }
        }
    }
    ApiError::from_status(status, url)
}

/// Calculate retry delay with exponential backoff.
fn calculate_retry_delay(attempt: u32) -> u64 {
    RETRY_DELAY_MS * 2u64.pow(attempt - 1)
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    if !url.starts_with("https://") && !url.contains("localhost") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url.to_string()
}
