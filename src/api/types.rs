//! Redmine API request and response types.
//!
//! These types model the Redmine REST API JSON responses for issues, users,
//! projects and the enumerations used when editing an issue.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label shown for an issue without an assignee.
pub const UNASSIGNED: &str = "Unassigned";

/// Maximum page size accepted by Redmine list endpoints.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A reference to another Redmine entity, as embedded in an issue.
///
/// Projects, trackers, statuses, priorities and users all appear inside an
/// issue as `{"id": 1, "name": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdName {
    /// The entity ID.
    pub id: u64,
    /// The display name.
    #[serde(default)]
    pub name: String,
}

impl IdName {
    /// Create a new reference.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for IdName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A Redmine issue.
///
/// Returned by `GET /issues.json` (without journals) and
/// `GET /issues/{id}.json?include=journals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// The issue ID.
    pub id: u64,
    /// The project this issue belongs to.
    pub project: IdName,
    /// The tracker (Bug, Feature, Support, ...).
    pub tracker: IdName,
    /// The current status.
    pub status: IdName,
    /// The priority.
    pub priority: IdName,
    /// Who created the issue.
    pub author: IdName,
    /// The assignee, if any.
    #[serde(default)]
    pub assigned_to: Option<IdName>,
    /// The issue subject/title.
    pub subject: String,
    /// The issue description. Redmine sends `null` for an empty description.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Start date (`YYYY-MM-DD`).
    #[serde(default)]
    pub start_date: Option<String>,
    /// Due date (`YYYY-MM-DD`).
    #[serde(default)]
    pub due_date: Option<String>,
    /// Progress, 0 to 100.
    #[serde(default)]
    pub done_ratio: u8,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created_on: String,
    /// Last update timestamp (ISO 8601).
    #[serde(default)]
    pub updated_on: String,
    /// Change history, only present when requested with `include=journals`.
    #[serde(default)]
    pub journals: Vec<Journal>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Issue {
    /// Get the assignee display name, or "Unassigned" if not set.
    pub fn assignee_name(&self) -> &str {
        self.assigned_to
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or(UNASSIGNED)
    }

    /// Get the assignee user ID, if assigned.
    pub fn assignee_id(&self) -> Option<u64> {
        self.assigned_to.as_ref().map(|u| u.id)
    }

    /// Get the due date, or an empty string if not set.
    pub fn due_date_text(&self) -> &str {
        self.due_date.as_deref().unwrap_or("")
    }

    /// Format a timestamp as `YYYY-MM-DD HH:MM` for display.
    pub fn short_timestamp(ts: &str) -> String {
        let trimmed: String = ts.chars().take(16).collect();
        trimmed.replacen('T', " ", 1)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.id, self.subject)
    }
}

/// A single change-history entry of an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    /// The journal ID.
    pub id: u64,
    /// Who made the change.
    pub user: IdName,
    /// Free-text notes attached to the change.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
    /// When the change was made.
    #[serde(default)]
    pub created_on: String,
    /// Property changes.
    #[serde(default)]
    pub details: Vec<JournalDetail>,
}

/// A single property change inside a journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalDetail {
    /// The kind of property (`attr`, `cf`, `attachment`, ...).
    #[serde(default)]
    pub property: String,
    /// The property name (e.g. `status_id`).
    pub name: String,
    /// Value before the change.
    #[serde(default)]
    pub old_value: Option<String>,
    /// Value after the change.
    #[serde(default)]
    pub new_value: Option<String>,
}

/// A Redmine user, as returned by `/users.json` and `/users/current.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user ID.
    pub id: u64,
    /// The login name.
    #[serde(default)]
    pub login: String,
    /// First name.
    #[serde(default)]
    pub firstname: String,
    /// Last name.
    #[serde(default)]
    pub lastname: String,
    /// Full name, only sent by some endpoints.
    #[serde(default)]
    pub name: String,
    /// Email address (may be hidden).
    #[serde(default)]
    pub mail: Option<String>,
}

impl User {
    /// The name shown for this user.
    ///
    /// Falls back from the full name to "first last", then the login, then
    /// a generic "User N" label.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        let full = format!("{} {}", self.firstname, self.lastname);
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        if !self.login.is_empty() {
            return self.login.clone();
        }
        format!("User {}", self.id)
    }

    /// The label shown in the user picker: display name plus login when they differ.
    pub fn picker_label(&self) -> String {
        let name = self.display_name();
        if !self.login.is_empty() && name != self.login {
            format!("{} ({})", name, self.login)
        } else {
            name
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A Redmine project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The project ID.
    pub id: u64,
    /// The project name.
    pub name: String,
    /// The project identifier (URL slug).
    #[serde(default)]
    pub identifier: String,
}

/// An issue status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStatus {
    /// The status ID.
    pub id: u64,
    /// The status name (e.g. "New", "In Progress", "Closed").
    pub name: String,
    /// Whether issues in this status count as closed.
    #[serde(default)]
    pub is_closed: bool,
}

/// An issue priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    /// The priority ID.
    pub id: u64,
    /// The priority name (e.g. "Low", "Normal", "High").
    pub name: String,
    /// Whether this is the default priority.
    #[serde(default)]
    pub is_default: bool,
}

/// A page of issues.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuesPage {
    /// The issues on this page.
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Total number of matching issues.
    #[serde(default)]
    pub total_count: u32,
    /// Offset of the first issue.
    #[serde(default)]
    pub offset: u32,
    /// The page size used by the server.
    #[serde(default)]
    pub limit: u32,
}

impl IssuesPage {
    /// Check if there are more pages of results.
    pub fn has_more(&self) -> bool {
        self.offset + (self.issues.len() as u32) < self.total_count
    }
}

/// Envelope for `GET /issues/{id}.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueEnvelope {
    pub issue: Issue,
}

/// A page of users.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersPage {
    #[serde(default)]
    pub users: Vec<User>,
}

/// Envelope for `GET /users/current.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}

/// A page of projects.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectsPage {
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// Response of `GET /issue_statuses.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusesResponse {
    #[serde(default)]
    pub issue_statuses: Vec<IssueStatus>,
}

/// Response of `GET /enumerations/issue_priorities.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct PrioritiesResponse {
    #[serde(default)]
    pub issue_priorities: Vec<Priority>,
}

/// The field map sent with `PUT /issues/{id}.json`.
///
/// Values are already coerced to their wire form (IDs, integers, `null`).
pub type IssueUpdate = serde_json::Map<String, serde_json::Value>;

/// Which assignee to constrain an issue query to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssigneeFilter {
    /// No constraint.
    #[default]
    Any,
    /// Issues assigned to the authenticated user.
    Me,
    /// Issues assigned to a specific user.
    User(u64),
}

/// Server-side constraints for an issue list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    /// Restrict to a single project.
    pub project_id: Option<u64>,
    /// Restrict by assignee.
    pub assignee: AssigneeFilter,
    /// Only open issues.
    pub open_only: bool,
    /// Page size.
    pub limit: u32,
    /// Offset of the first issue.
    pub offset: u32,
}

impl Default for IssueQuery {
    fn default() -> Self {
        Self {
            project_id: None,
            assignee: AssigneeFilter::Any,
            open_only: true,
            limit: MAX_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl IssueQuery {
    /// Build the URL query string for `GET /issues.json`.
    pub fn to_query_string(&self) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(project_id) = self.project_id {
            params.push(("project_id", project_id.to_string()));
        }
        match self.assignee {
            AssigneeFilter::Any => {}
            AssigneeFilter::Me => params.push(("assigned_to_id", "me".to_string())),
            AssigneeFilter::User(id) => params.push(("assigned_to_id", id.to_string())),
        }
        if self.open_only {
            params.push(("status_id", "open".to_string()));
        }
        params.push(("limit", self.limit.min(MAX_PAGE_SIZE).to_string()));
        params.push(("offset", self.offset.to_string()));

        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
