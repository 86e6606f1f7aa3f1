//! Background execution of effects requested by the application.
//!
//! The application never awaits network calls itself. Each [`Effect`] is
//! run on a tokio task and its outcome comes back through an unbounded
//! channel as an [`ApiMessage`], which the main loop drains with
//! `try_recv()` and hands to [`App::apply`](crate::app::App::apply).
//!
//! Results may arrive in any order. Messages carry the identifiers the
//! application needs to discard superseded responses.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::types::{IssueStatus, IssuesPage, Priority, Project, User, MAX_PAGE_SIZE};
use crate::api::{Issue, RedmineClient};
use crate::app::Effect;

/// Upper bound on pages requested when loading picker candidates.
const MAX_CANDIDATE_PAGES: u32 = 20;

/// Messages sent from background tasks to the main event loop.
#[derive(Debug)]
pub enum ApiMessage {
    /// Issue list fetch result, tagged with the fetch generation.
    IssuesLoaded {
        generation: u64,
        result: Result<IssuesPage, String>,
    },

    /// Single issue (with history) fetch result.
    IssueLoaded {
        id: u64,
        result: Result<Issue, String>,
    },

    /// All users, for the assignee picker and the assignee field.
    UsersLoaded(Result<Vec<User>, String>),

    /// All projects, for the project picker.
    ProjectsLoaded(Result<Vec<Project>, String>),

    StatusesLoaded(Result<Vec<IssueStatus>, String>),

    PrioritiesLoaded(Result<Vec<Priority>, String>),

    CurrentUserLoaded(Result<User, String>),

    /// Issue update result.
    IssueUpdated {
        id: u64,
        result: Result<(), String>,
    },

    /// Result of handing an issue URL to the platform opener.
    BrowserOpened {
        id: u64,
        result: Result<(), String>,
    },
}

/// Spawns background tasks for effects.
#[derive(Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<ApiMessage>,
    client: RedmineClient,
}

impl TaskSpawner {
    /// Create a new TaskSpawner sending results to `tx`.
    pub fn new(tx: mpsc::UnboundedSender<ApiMessage>, client: RedmineClient) -> Self {
        Self { tx, client }
    }

    /// Run every effect in order of submission.
    pub fn execute_all(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.execute(effect);
        }
    }

    /// Spawn the task carrying out one effect.
    pub fn execute(&self, effect: Effect) {
        debug!(?effect, "Executing effect");
        match effect {
            Effect::FetchIssues { generation, query } => {
                self.spawn(move |client| async move {
                    let result = client.fetch_issues(&query).await.map_err(|e| e.to_string());
                    ApiMessage::IssuesLoaded { generation, result }
                });
            }
            Effect::FetchIssue { id } => {
                self.spawn(move |client| async move {
                    let result = client.fetch_issue(id).await.map_err(|e| e.to_string());
                    ApiMessage::IssueLoaded { id, result }
                });
            }
            Effect::FetchUsers => {
                self.spawn(|client| async move {
                    let result = fetch_all_users(&client).await;
                    ApiMessage::UsersLoaded(result)
                });
            }
            Effect::FetchProjects => {
                self.spawn(|client| async move {
                    let result = fetch_all_projects(&client).await;
                    ApiMessage::ProjectsLoaded(result)
                });
            }
            Effect::FetchStatuses => {
                self.spawn(|client| async move {
                    let result = client.fetch_statuses().await.map_err(|e| e.to_string());
                    ApiMessage::StatusesLoaded(result)
                });
            }
            Effect::FetchPriorities => {
                self.spawn(|client| async move {
                    let result = client.fetch_priorities().await.map_err(|e| e.to_string());
                    ApiMessage::PrioritiesLoaded(result)
                });
            }
            Effect::FetchCurrentUser => {
                self.spawn(|client| async move {
                    let result = client.fetch_current_user().await.map_err(|e| e.to_string());
                    ApiMessage::CurrentUserLoaded(result)
                });
            }
            Effect::UpdateIssue { id, fields } => {
                self.spawn(move |client| async move {
                    let result = client
                        .update_issue(id, &fields)
                        .await
                        .map_err(|e| e.to_string());
                    ApiMessage::IssueUpdated { id, result }
                });
            }
            Effect::OpenInBrowser { id } => {
                let url = self.client.issue_web_url(id);
                let tx = self.tx.clone();
                tokio::task::spawn_blocking(move || {
                    let result = open::that(&url).map_err(|e| e.to_string());
                    if let Err(e) = &result {
                        warn!(%url, error = %e, "Failed to open browser");
                    }
                    let _ = tx.send(ApiMessage::BrowserOpened { id, result });
                });
            }
        }
    }

    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(RedmineClient) -> Fut,
        Fut: std::future::Future<Output = ApiMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        let fut = task(self.client.clone());
        tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
    }
}

/// Page through `/users.json` until a short page.
async fn fetch_all_users(client: &RedmineClient) -> Result<Vec<User>, String> {
    let mut users = Vec::new();
    for page in 0..MAX_CANDIDATE_PAGES {
        let batch = client
            .fetch_users(MAX_PAGE_SIZE, page * MAX_PAGE_SIZE)
            .await
            .map_err(|e| e.to_string())?;
        let done = (batch.len() as u32) < MAX_PAGE_SIZE;
        users.extend(batch);
        if done {
            return Ok(users);
        }
    }
    warn!(count = users.len(), "User list truncated");
    Ok(users)
}

/// Page through `/projects.json` until a short page.
async fn fetch_all_projects(client: &RedmineClient) -> Result<Vec<Project>, String> {
    let mut projects = Vec::new();
    for page in 0..MAX_CANDIDATE_PAGES {
        let batch = client
            .fetch_projects(MAX_PAGE_SIZE, page * MAX_PAGE_SIZE)
            .await
            .map_err(|e| e.to_string())?;
        let done = (batch.len() as u32) < MAX_PAGE_SIZE;
        projects.extend(batch);
        if done {
            return Ok(projects);
        }
    }
    warn!(count = projects.len(), "Project list truncated");
    Ok(projects)
}

/// Create a new task channel and spawner.
///
/// Returns a tuple of (receiver, spawner). The receiver should be polled
/// in the main event loop, and the spawner should be used to run effects.
pub fn create_task_channel(
    client: RedmineClient,
) -> (mpsc::UnboundedReceiver<ApiMessage>, TaskSpawner) {
    let (tx, rx) = mpsc::unbounded_channel();
    (rx, TaskSpawner::new(tx, client))
}
