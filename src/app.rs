//! Main application state and event loop.
//!
//! This module implements The Elm Architecture (TEA): [`App::update`] turns
//! terminal events into state changes, [`App::apply`] folds background task
//! results into the state, and [`App::view`] renders it. Neither `update`
//! nor `apply` performs I/O. They return [`Effect`]s which the caller hands
//! to the task spawner.

use std::collections::{BTreeMap, BTreeSet};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use tracing::{debug, info, trace, warn};

use crate::api::types::{IssueStatus, Priority, Project, User};
use crate::api::{Issue, IssueQuery, IssueUpdate};
use crate::config::{Scope, Settings};
use crate::edit::{EditAction, EditOptions, EditSession};
use crate::events::{browse_action, is_quit, BrowseAction, Event};
use crate::filter::{filtered_indices, FilterState};
use crate::tasks::ApiMessage;
use crate::ui::components::{
    LoadingIndicator, MultiSelect, MultiSelectAction, NotificationManager, SelectItem, TextInput,
};
use crate::ui::theme::theme;
use crate::ui::views::{self, window_size, BannerEntry, DetailProps, IssueListProps};

/// Lines scrolled by PgUp/PgDn in the detail pane.
const DETAIL_PAGE: u16 = 10;

/// The active input mode. Exactly one is active at a time.
#[derive(Debug, Clone)]
pub enum ViewMode {
    /// Navigating the issue list.
    Browse,
    /// Typing a free-text filter. The buffer previews the filter live.
    TextFilterInput(TextInput),
    /// Choosing assignees to filter by.
    UserPicker(MultiSelect),
    /// Choosing projects to filter by.
    ProjectPicker(MultiSelect),
    /// Editing the fields of one issue.
    EditSession(EditSession),
}

impl ViewMode {
    /// Short name shown in the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Browse => "BROWSE",
            ViewMode::TextFilterInput(_) => "FILTER",
            ViewMode::UserPicker(_) => "USERS",
            ViewMode::ProjectPicker(_) => "PROJECTS",
            ViewMode::EditSession(_) => "EDIT",
        }
    }
}

/// Work the application asks the outer loop to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchIssues { generation: u64, query: IssueQuery },
    FetchIssue { id: u64 },
    FetchUsers,
    FetchProjects,
    FetchStatuses,
    FetchPriorities,
    FetchCurrentUser,
    UpdateIssue { id: u64, fields: IssueUpdate },
    OpenInBrowser { id: u64 },
}

/// Which pane receives navigation keys in browse mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    List,
    Detail,
}

/// An edit session whose save was submitted or failed.
#[derive(Debug)]
struct ParkedSave {
    session: EditSession,
    /// The update request has not been answered yet.
    in_flight: bool,
}

/// The main application struct that holds all state.
pub struct App {
    mode: ViewMode,
    should_quit: bool,
    settings: Settings,
    server_url: String,
    scope: Scope,

    /// Last fetched issues, in server order.
    issues: Vec<Issue>,
    total_count: u32,
    /// The server holds more matching issues than one page returned.
    more_available: bool,
    /// Positions in `issues` passing the filter.
    filtered: Vec<usize>,
    /// Index into `filtered`.
    selected: usize,
    filter: FilterState,
    /// Generation of the latest issue list request.
    generation: u64,
    last_query: Option<IssueQuery>,
    issues_loading: bool,

    /// Fully loaded issue (with history) for the detail pane.
    detail: Option<Issue>,
    requested_detail: Option<u64>,
    detail_scroll: u16,
    focus: Focus,

    users: Option<Vec<User>>,
    users_loading: bool,
    projects: Option<Vec<Project>>,
    projects_loading: bool,
    statuses: Vec<IssueStatus>,
    priorities: Vec<Priority>,
    current_user: Option<User>,

    /// Sessions whose save is in flight or failed, by issue id.
    parked: BTreeMap<u64, ParkedSave>,

    /// Transport failure shown until the next successful fetch.
    error: Option<String>,
    notifications: NotificationManager,
    spinner: LoadingIndicator,
    show_help: bool,
    size: (u16, u16),
}

impl App {
    /// Create an application for `server_url` with nothing loaded yet.
    pub fn new(server_url: impl Into<String>, settings: Settings) -> Self {
        let scope = settings.default_scope;
        debug!(?scope, "Creating new application instance");

        Self {
            mode: ViewMode::Browse,
            should_quit: false,
            settings,
            server_url: server_url.into(),
            scope,
            issues: Vec::new(),
            total_count: 0,
            more_available: false,
            filtered: Vec::new(),
            selected: 0,
            filter: FilterState::default(),
            generation: 0,
            last_query: None,
            issues_loading: false,
            detail: None,
            requested_detail: None,
            detail_scroll: 0,
            focus: Focus::List,
            users: None,
            users_loading: false,
            projects: None,
            projects_loading: false,
            statuses: Vec::new(),
            priorities: Vec::new(),
            current_user: None,
            parked: BTreeMap::new(),
            error: None,
            notifications: NotificationManager::new(),
            spinner: LoadingIndicator::new(),
            show_help: false,
            size: (80, 24),
        }
    }

    /// Startup requests: reference data, the first issue page and the
    /// user list used by the assignee field.
    pub fn init(&mut self) -> Vec<Effect> {
        info!(server = %self.server_url, "Starting session");
        self.users_loading = true;
        vec![
            Effect::FetchCurrentUser,
            Effect::FetchStatuses,
            Effect::FetchPriorities,
            self.fetch_issues(),
            Effect::FetchUsers,
        ]
    }

    // ========================================================================
    // Read-only accessors
    // ========================================================================

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Committed filter inputs.
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    /// Issues in the current filtered view, in display order.
    pub fn filtered_issues(&self) -> Vec<&Issue> {
        self.filtered.iter().map(|&i| &self.issues[i]).collect()
    }

    /// Index of the selection in the filtered view.
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// The selected issue, if the filtered view is not empty.
    pub fn selected_issue(&self) -> Option<&Issue> {
        self.filtered
            .get(self.selected)
            .and_then(|&i| self.issues.get(i))
    }

    /// Best known version of an issue: the loaded detail if it matches,
    /// else the catalog entry.
    fn issue_by_id(&self, id: u64) -> Option<&Issue> {
        match &self.detail {
            Some(detail) if detail.id == id => Some(detail),
            _ => self.issues.iter().find(|issue| issue.id == id),
        }
    }

    /// The issue shown in the detail pane.
    pub fn displayed_issue(&self) -> Option<&Issue> {
        match &self.mode {
            ViewMode::EditSession(session) => self.issue_by_id(session.issue_id()),
            _ => self.selected_issue().and_then(|i| self.issue_by_id(i.id)),
        }
    }

    fn edit_options(&self) -> EditOptions<'_> {
        EditOptions {
            statuses: &self.statuses,
            priorities: &self.priorities,
            users: self.users.as_deref().unwrap_or_default(),
        }
    }

    // ========================================================================
    // Catalog and filter maintenance
    // ========================================================================

    /// Filter used for the visible list: the committed filter, with the
    /// text replaced by the input buffer while it is being typed.
    fn view_filter(&self) -> FilterState {
        match &self.mode {
            ViewMode::TextFilterInput(input) => FilterState {
                text: input.value().trim().to_string(),
                ..self.filter.clone()
            },
            _ => self.filter.clone(),
        }
    }

    /// Recompute the filtered view, keeping the selected issue when it is
    /// still visible and clamping the index otherwise.
    fn refilter(&mut self) {
        let previous = self.selected_issue().map(|issue| issue.id);
        self.filtered = filtered_indices(&self.issues, &self.view_filter());

        if let Some(position) = previous.and_then(|id| {
            self.filtered
                .iter()
                .position(|&i| self.issues[i].id == id)
        }) {
            self.selected = position;
        } else {
            self.selected = self.selected.min(self.filtered.len().saturating_sub(1));
        }
    }

    /// Recompute the filtered view and move the selection to the top.
    fn refilter_from_top(&mut self) -> Vec<Effect> {
        self.filtered = filtered_indices(&self.issues, &self.view_filter());
        self.selected = 0;
        self.detail_scroll = 0;
        self.sync_detail()
    }

    fn current_query(&self) -> IssueQuery {
        self.filter
            .server_query(self.scope, self.settings.open_only, self.settings.page_size)
    }

    /// Start a new issue list request. Older responses become stale.
    fn fetch_issues(&mut self) -> Effect {
        self.generation += 1;
        self.issues_loading = true;
        let query = self.current_query();
        self.last_query = Some(query.clone());
        debug!(generation = self.generation, ?query, "Fetching issues");
        Effect::FetchIssues {
            generation: self.generation,
            query,
        }
    }

    /// After a filter change: refetch when the server query changed,
    /// otherwise narrow the loaded issues locally.
    fn apply_filter_change(&mut self) -> Vec<Effect> {
        self.selected = 0;
        self.detail_scroll = 0;
        if self.last_query.as_ref() == Some(&self.current_query()) {
            debug!("Server query unchanged, filtering locally");
            self.refilter_from_top()
        } else {
            // Narrow what is loaded until the new page arrives.
            let mut effects = self.refilter_from_top();
            effects.insert(0, self.fetch_issues());
            effects
        }
    }

    /// Request the selected issue's history once per selection.
    fn sync_detail(&mut self) -> Vec<Effect> {
        let Some(id) = self.selected_issue().map(|issue| issue.id) else {
            return Vec::new();
        };
        if self.requested_detail == Some(id) {
            return Vec::new();
        }
        self.requested_detail = Some(id);
        vec![Effect::FetchIssue { id }]
    }

    fn move_selection(&mut self, target: usize) -> Vec<Effect> {
        if self.filtered.is_empty() {
            return Vec::new();
        }
        let target = target.min(self.filtered.len() - 1);
        if target != self.selected {
            trace!(from = self.selected, to = target, "Selection moved");
            self.selected = target;
            self.detail_scroll = 0;
        }
        self.sync_detail()
    }

    /// Number of issues one page of the list pane shows.
    fn page_size(&self) -> usize {
        // Header, footer and the pane borders.
        let content = self.size.1.saturating_sub(4) as usize;
        window_size(content, self.view_filter().banner_lines())
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Update the application state based on an event.
    pub fn update(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Resize(width, height) => {
                trace!(width, height, "Terminal resize event");
                self.size = (width, height);
                Vec::new()
            }
            Event::Tick => {
                self.spinner.tick();
                self.notifications.tick();
                Vec::new()
            }
            Event::Key(key) => {
                trace!(key = ?key.code, modifiers = ?key.modifiers, "Key event");
                self.handle_key(key)
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if is_quit(&key) {
            info!("Quit requested");
            self.should_quit = true;
            return Vec::new();
        }

        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc
            ) {
                self.show_help = false;
            }
            return Vec::new();
        }

        match self.mode {
            ViewMode::Browse => self.handle_browse_key(key),
            ViewMode::TextFilterInput(_) => self.handle_text_filter_key(key),
            ViewMode::UserPicker(_) | ViewMode::ProjectPicker(_) => self.handle_picker_key(key),
            ViewMode::EditSession(_) => self.handle_edit_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let Some(action) = browse_action(&key) else {
            return Vec::new();
        };

        match action {
            BrowseAction::Up | BrowseAction::Down | BrowseAction::PageUp | BrowseAction::PageDown
                if self.focus == Focus::Detail =>
            {
                self.detail_scroll = match action {
                    BrowseAction::Up => self.detail_scroll.saturating_sub(1),
                    BrowseAction::Down => self.detail_scroll.saturating_add(1),
                    BrowseAction::PageUp => self.detail_scroll.saturating_sub(DETAIL_PAGE),
                    _ => self.detail_scroll.saturating_add(DETAIL_PAGE),
                };
                Vec::new()
            }
            BrowseAction::Up => self.move_selection(self.selected.saturating_sub(1)),
            BrowseAction::Down => self.move_selection(self.selected + 1),
            BrowseAction::PageUp => {
                self.move_selection(self.selected.saturating_sub(self.page_size()))
            }
            BrowseAction::PageDown => self.move_selection(self.selected + self.page_size()),
            BrowseAction::Top => self.move_selection(0),
            BrowseAction::Bottom => self.move_selection(usize::MAX),
            BrowseAction::SwitchPane => {
                self.focus = match self.focus {
                    Focus::List => Focus::Detail,
                    Focus::Detail => Focus::List,
                };
                Vec::new()
            }
            BrowseAction::StartTextFilter => {
                let mut input = TextInput::with_value(self.filter.text.clone());
                input.set_placeholder("Search id, subject, status, project, assignee");
                self.mode = ViewMode::TextFilterInput(input);
                Vec::new()
            }
            BrowseAction::ClearFilters => {
                if !self.filter.is_active() {
                    return Vec::new();
                }
                info!("Clearing filters");
                self.filter = FilterState::default();
                self.apply_filter_change()
            }
            BrowseAction::ToggleScope => {
                self.scope = self.scope.toggled();
                info!(scope = ?self.scope, "Scope changed");
                self.notifications.info(self.scope.label());
                self.selected = 0;
                self.detail_scroll = 0;
                vec![self.fetch_issues()]
            }
            BrowseAction::OpenUserPicker => self.open_user_picker(),
            BrowseAction::OpenProjectPicker => self.open_project_picker(),
            BrowseAction::Edit => {
                self.start_edit();
                Vec::new()
            }
            BrowseAction::Refresh => {
                info!("Refreshing issues");
                self.requested_detail = None;
                vec![self.fetch_issues()]
            }
            BrowseAction::OpenInBrowser => match self.selected_issue() {
                Some(issue) => vec![Effect::OpenInBrowser { id: issue.id }],
                None => Vec::new(),
            },
            BrowseAction::ToggleHelp => {
                self.show_help = true;
                Vec::new()
            }
            BrowseAction::Quit => {
                info!("Quit requested");
                self.should_quit = true;
                Vec::new()
            }
        }
    }

    fn handle_text_filter_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let ViewMode::TextFilterInput(input) = &mut self.mode else {
            return Vec::new();
        };

        match key.code {
            KeyCode::Esc => {
                debug!("Text filter cancelled");
                self.mode = ViewMode::Browse;
                self.refilter();
                self.sync_detail()
            }
            KeyCode::Enter => {
                self.filter.text = input.value().trim().to_string();
                debug!(text = %self.filter.text, "Text filter applied");
                self.mode = ViewMode::Browse;
                self.refilter_from_top()
            }
            _ => {
                if input.handle_input(key) {
                    self.refilter();
                }
                Vec::new()
            }
        }
    }

    fn open_user_picker(&mut self) -> Vec<Effect> {
        let mut picker = MultiSelect::new("Filter by assignee", self.filter.user_ids.clone());
        let mut effects = Vec::new();
        match &self.users {
            Some(users) => picker.set_items(user_items(users)),
            None if self.users_loading => {}
            None => {
                self.users_loading = true;
                effects.push(Effect::FetchUsers);
            }
        }
        self.mode = ViewMode::UserPicker(picker);
        effects
    }

    fn open_project_picker(&mut self) -> Vec<Effect> {
        let mut picker = MultiSelect::new("Filter by project", self.filter.project_ids.clone());
        let mut effects = Vec::new();
        match &self.projects {
            Some(projects) => picker.set_items(project_items(projects)),
            None if self.projects_loading => {}
            None => {
                self.projects_loading = true;
                effects.push(Effect::FetchProjects);
            }
        }
        self.mode = ViewMode::ProjectPicker(picker);
        effects
    }

    fn handle_picker_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let (action, users) = match &mut self.mode {
            ViewMode::UserPicker(picker) => (picker.handle_input(key), true),
            ViewMode::ProjectPicker(picker) => (picker.handle_input(key), false),
            _ => return Vec::new(),
        };

        match action {
            None => Vec::new(),
            Some(MultiSelectAction::Cancel) => {
                debug!("Picker cancelled");
                self.mode = ViewMode::Browse;
                Vec::new()
            }
            Some(MultiSelectAction::Confirm(ids)) => {
                self.mode = ViewMode::Browse;
                let target = if users {
                    &mut self.filter.user_ids
                } else {
                    &mut self.filter.project_ids
                };
                if *target == ids {
                    return Vec::new();
                }
                info!(count = ids.len(), users, "Picker selection applied");
                *target = ids;
                self.apply_filter_change()
            }
        }
    }

    /// Open (or reopen) an edit session on the selected issue.
    fn start_edit(&mut self) {
        let Some(id) = self.selected_issue().map(|issue| issue.id) else {
            debug!("Edit ignored: no issue selected");
            return;
        };

        match self.parked.get(&id) {
            Some(parked) if parked.in_flight => {
                self.notifications.info(format!("Save of #{} in progress", id));
                return;
            }
            Some(_) => {
                if let Some(parked) = self.parked.remove(&id) {
                    info!(issue_id = id, "Reopening unsaved edit session");
                    self.mode = ViewMode::EditSession(parked.session);
                }
                return;
            }
            None => {}
        }

        if let Some(issue) = self.issue_by_id(id) {
            let session = EditSession::open(issue);
            self.mode = ViewMode::EditSession(session);
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let mut session = match std::mem::replace(&mut self.mode, ViewMode::Browse) {
            ViewMode::EditSession(session) => session,
            other => {
                self.mode = other;
                return Vec::new();
            }
        };

        let action = session.handle_key(key, &self.edit_options());

        match action {
            EditAction::Continue => {
                self.mode = ViewMode::EditSession(session);
                Vec::new()
            }
            EditAction::Cancel => {
                debug!(issue_id = session.issue_id(), "Edit cancelled");
                if session.has_unsaved_changes() {
                    self.notifications.info("Changes discarded");
                }
                Vec::new()
            }
            EditAction::NothingToSave => {
                self.notifications.info("No changes to save");
                Vec::new()
            }
            EditAction::Save(fields) => {
                let id = session.issue_id();
                info!(issue_id = id, fields = fields.len(), "Saving issue");
                self.notifications.info(format!("Saving #{}...", id));
                self.parked.insert(
                    id,
                    ParkedSave {
                        session,
                        in_flight: true,
                    },
                );
                vec![Effect::UpdateIssue { id, fields }]
            }
        }
    }

    // ========================================================================
    // Task results
    // ========================================================================

    /// Fold a background task result into the state.
    pub fn apply(&mut self, message: ApiMessage) -> Vec<Effect> {
        match message {
            ApiMessage::IssuesLoaded { generation, result } => {
                if generation != self.generation {
                    debug!(generation, latest = self.generation, "Discarding stale issue list");
                    return Vec::new();
                }
                self.issues_loading = false;
                match result {
                    Ok(page) => {
                        info!(count = page.issues.len(), total = page.total_count, "Issues loaded");
                        self.more_available = page.has_more();
                        self.issues = page.issues;
                        self.total_count = page.total_count;
                        self.error = None;
                        self.refilter();
                        self.sync_detail()
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to load issues");
                        self.error = Some(format!("Failed to load issues: {}", e));
                        Vec::new()
                    }
                }
            }
            ApiMessage::IssueLoaded { id, result } => {
                match result {
                    Ok(issue) => {
                        if let Some(entry) = self.issues.iter_mut().find(|i| i.id == id) {
                            *entry = issue.clone();
                            // The fresh copy may no longer pass the filter.
                            self.refilter();
                        }
                        if self.selected_issue().map(|i| i.id) == Some(id) {
                            self.error = None;
                            self.detail = Some(issue);
                            Vec::new()
                        } else {
                            debug!(issue_id = id, "Issue no longer selected, detail not shown");
                            self.sync_detail()
                        }
                    }
                    Err(e) => {
                        warn!(issue_id = id, error = %e, "Failed to load issue");
                        if self.requested_detail == Some(id) {
                            self.requested_detail = None;
                        }
                        if self.selected_issue().map(|i| i.id) == Some(id) {
                            self.error = Some(format!("Failed to load #{}: {}", id, e));
                        }
                        Vec::new()
                    }
                }
            }
            ApiMessage::UsersLoaded(result) => {
                self.users_loading = false;
                match result {
                    Ok(users) => {
                        debug!(count = users.len(), "Users loaded");
                        if let ViewMode::UserPicker(picker) = &mut self.mode {
                            if picker.is_loading() {
                                picker.set_items(user_items(&users));
                            }
                        }
                        self.users = Some(users);
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to load users");
                        if matches!(&self.mode, ViewMode::UserPicker(p) if p.is_loading()) {
                            self.mode = ViewMode::Browse;
                            self.error = Some(format!("Failed to load users: {}", e));
                        }
                    }
                }
                Vec::new()
            }
            ApiMessage::ProjectsLoaded(result) => {
                self.projects_loading = false;
                match result {
                    Ok(projects) => {
                        debug!(count = projects.len(), "Projects loaded");
                        if let ViewMode::ProjectPicker(picker) = &mut self.mode {
                            if picker.is_loading() {
                                picker.set_items(project_items(&projects));
                            }
                        }
                        self.projects = Some(projects);
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to load projects");
                        if matches!(&self.mode, ViewMode::ProjectPicker(p) if p.is_loading()) {
                            self.mode = ViewMode::Browse;
                            self.error = Some(format!("Failed to load projects: {}", e));
                        }
                    }
                }
                Vec::new()
            }
            ApiMessage::StatusesLoaded(result) => {
                match result {
                    Ok(statuses) => self.statuses = statuses,
                    Err(e) => {
                        warn!(error = %e, "Failed to load statuses");
                        self.error = Some(format!("Failed to load statuses: {}", e));
                    }
                }
                Vec::new()
            }
            ApiMessage::PrioritiesLoaded(result) => {
                match result {
                    Ok(priorities) => self.priorities = priorities,
                    Err(e) => warn!(error = %e, "Failed to load priorities"),
                }
                Vec::new()
            }
            ApiMessage::CurrentUserLoaded(result) => {
                match result {
                    Ok(user) => {
                        info!(login = %user.login, "Signed in");
                        self.current_user = Some(user);
                    }
                    Err(e) => warn!(error = %e, "Failed to load current user"),
                }
                Vec::new()
            }
            ApiMessage::IssueUpdated { id, result } => self.finish_save(id, result),
            ApiMessage::BrowserOpened { id, result } => {
                match result {
                    Ok(()) => self.notifications.info(format!("Opened #{} in browser", id)),
                    Err(e) => self
                        .notifications
                        .error(format!("Could not open browser: {}", e)),
                }
                Vec::new()
            }
        }
    }

    fn finish_save(&mut self, id: u64, result: Result<(), String>) -> Vec<Effect> {
        let parked = self.parked.remove(&id);

        match result {
            Ok(()) => {
                info!(issue_id = id, "Issue updated");
                self.notifications.success(format!("Updated #{}", id));
                self.requested_detail = Some(id);
                vec![Effect::FetchIssue { id }, self.fetch_issues()]
            }
            Err(e) => {
                warn!(issue_id = id, error = %e, "Failed to update issue");
                self.notifications
                    .error(format!("Failed to update #{}: {}", id, e));
                self.error = Some(format!("Failed to update #{}: {}", id, e));

                if let Some(mut parked) = parked {
                    if matches!(self.mode, ViewMode::Browse) {
                        debug!(issue_id = id, "Restoring edit session after failed save");
                        self.mode = ViewMode::EditSession(parked.session);
                    } else {
                        parked.in_flight = false;
                        self.parked.insert(id, parked);
                    }
                }
                Vec::new()
            }
        }
    }

    // ========================================================================
    // View
    // ========================================================================

    fn user_name(&self, id: u64) -> String {
        if let Some(user) = self.users.iter().flatten().find(|u| u.id == id) {
            return user.display_name();
        }
        self.issues
            .iter()
            .filter_map(|issue| issue.assigned_to.as_ref())
            .find(|user| user.id == id)
            .map(|user| user.name.clone())
            .unwrap_or_else(|| format!("User {}", id))
    }

    fn project_name(&self, id: u64) -> String {
        if let Some(project) = self.projects.iter().flatten().find(|p| p.id == id) {
            return project.name.clone();
        }
        self.issues
            .iter()
            .map(|issue| &issue.project)
            .find(|project| project.id == id)
            .map(|project| project.name.clone())
            .unwrap_or_else(|| format!("Project {}", id))
    }

    /// One banner line per active filter dimension.
    fn banner(&self) -> Vec<BannerEntry> {
        let filter = self.view_filter();
        let mut banner = Vec::new();
        if !filter.user_ids.is_empty() {
            banner.push(BannerEntry {
                label: "Assignees",
                value: join_names(&filter.user_ids, |id| self.user_name(id)),
            });
        }
        if !filter.project_ids.is_empty() {
            banner.push(BannerEntry {
                label: "Projects",
                value: join_names(&filter.project_ids, |id| self.project_name(id)),
            });
        }
        if !filter.text.is_empty() {
            banner.push(BannerEntry {
                label: "Text",
                value: format!("\"{}\"", filter.text),
            });
        }
        banner
    }

    /// Render the application UI.
    pub fn view(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.render_body(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);

        match &self.mode {
            ViewMode::UserPicker(picker) => picker.render(frame, chunks[1], theme().users),
            ViewMode::ProjectPicker(picker) => picker.render(frame, chunks[1], theme().projects),
            _ => {}
        }
        if self.show_help {
            views::help::render(frame, chunks[1]);
        }
        self.notifications.render(frame, area);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let t = theme();
        let base = Style::default().fg(t.header_fg).bg(t.header_bg);
        let user = self
            .current_user
            .as_ref()
            .map(User::display_name)
            .unwrap_or_else(|| "...".to_string());

        let left = Line::from(vec![
            Span::styled(" LazyRedmine ", base.add_modifier(Modifier::BOLD)),
            Span::styled(format!("│ {} ", self.server_url), base),
            Span::styled(format!("│ {} ", user), base),
            Span::styled(format!("│ {} ", self.scope.label()), base.fg(t.warning)),
        ]);
        frame.render_widget(Paragraph::new(left).style(base), area);

        let clock = chrono::Local::now().format("%Y-%m-%d %H:%M:%S ").to_string();
        frame.render_widget(
            Paragraph::new(clock).style(base).alignment(Alignment::Right),
            area,
        );
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let editing = match &self.mode {
            ViewMode::EditSession(session) => Some(session),
            _ => None,
        };

        let list = IssueListProps {
            issues: self.filtered_issues(),
            selected: self.selected,
            loaded: self.issues.len(),
            banner: self.banner(),
            loading: self.issues_loading,
            spinner: &self.spinner,
            focused: self.focus == Focus::List && editing.is_none(),
        };
        views::list::render(frame, panes[0], &list);

        let detail = DetailProps {
            issue: self.displayed_issue(),
            edit: editing,
            scroll: self.detail_scroll,
            focused: self.focus == Focus::Detail || editing.is_some(),
        };
        views::detail::render(frame, panes[1], &detail);

        if let ViewMode::TextFilterInput(input) = &self.mode {
            let height = 3.min(panes[0].height);
            let rect = Rect::new(
                panes[0].x,
                panes[0].bottom() - height,
                panes[0].width,
                height,
            );
            frame.render_widget(Clear, rect);
            input.render_with_label(frame, rect, "Filter (Enter: apply, Esc: cancel)", true);
        }
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let t = theme();
        let mut spans = vec![Span::styled(
            format!(" {} ", self.mode.label()),
            Style::default()
                .fg(t.header_fg)
                .bg(t.active_border)
                .add_modifier(Modifier::BOLD),
        )];

        if self.issues_loading {
            spans.push(Span::styled(
                format!(" {}", self.spinner.text("Loading")),
                Style::default().fg(t.active_border),
            ));
        }

        if self.more_available {
            spans.push(Span::styled(
                format!(" {} of {} loaded ", self.issues.len(), self.total_count),
                Style::default().fg(t.warning),
            ));
        }

        if let Some(error) = &self.error {
            spans.push(Span::styled(
                format!(" {} ", error),
                Style::default().fg(t.danger),
            ));
        } else {
            let hints = match self.mode {
                ViewMode::Browse => {
                    " j/k: Move  e: Edit  f: Filter  u: Users  p: Projects  c: Clear  m: Scope  r: Refresh  ?: Help  q: Quit"
                }
                ViewMode::TextFilterInput(_) => " Enter: Apply  Esc: Cancel",
                ViewMode::UserPicker(_) | ViewMode::ProjectPicker(_) => {
                    " Space: Toggle  Enter: Apply  Esc: Cancel"
                }
                ViewMode::EditSession(_) => " Tab: Next field  Ctrl+S: Save  Esc: Cancel",
            };
            spans.push(Span::styled(hints, Style::default().fg(t.dim)));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn join_names(ids: &BTreeSet<u64>, name: impl Fn(u64) -> String) -> String {
    ids.iter().map(|&id| name(id)).collect::<Vec<_>>().join(", ")
}

fn user_items(users: &[User]) -> Vec<SelectItem> {
    users
        .iter()
        .map(|user| SelectItem::new(user.id, user.picker_label()))
        .collect()
}

fn project_items(projects: &[Project]) -> Vec<SelectItem> {
    projects
        .iter()
        .map(|project| SelectItem::new(project.id, project.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{AssigneeFilter, IssuesPage, Journal};
    use crate::edit::fields::FieldId;
    use crate::filter::tests::issue;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ch(c: char) -> Event {
        key(KeyCode::Char(c))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.update(ch(c));
        }
    }

    fn page(issues: Vec<Issue>) -> IssuesPage {
        IssuesPage {
            total_count: issues.len() as u32,
            issues,
            offset: 0,
            limit: 100,
        }
    }

    fn catalog() -> Vec<Issue> {
        vec![
            issue(1, "Login page broken", Some(1), 1),
            issue(2, "Add export", Some(2), 1),
            issue(3, "Docs typo", None, 2),
        ]
    }

    fn user(id: u64, name: &str) -> User {
        User {
            id,
            login: name.to_lowercase(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn project(id: u64, name: &str) -> Project {
        Project {
            id,
            name: name.to_string(),
            identifier: name.to_lowercase(),
        }
    }

    /// App with the catalog loaded and users known.
    fn loaded_app() -> App {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();
        let generation = app.generation;
        app.apply(ApiMessage::IssuesLoaded {
            generation,
            result: Ok(page(catalog())),
        });
        app.apply(ApiMessage::UsersLoaded(Ok(vec![
            user(1, "Alice"),
            user(2, "Bob"),
        ])));
        app
    }

    fn fetches_issues(effects: &[Effect]) -> Option<&IssueQuery> {
        effects.iter().find_map(|effect| match effect {
            Effect::FetchIssues { query, .. } => Some(query),
            _ => None,
        })
    }

    fn ids(app: &App) -> Vec<u64> {
        app.filtered_issues().iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_init_requests_reference_data_and_issues() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        let effects = app.init();

        assert!(effects.contains(&Effect::FetchCurrentUser));
        assert!(effects.contains(&Effect::FetchStatuses));
        assert!(effects.contains(&Effect::FetchPriorities));
        assert!(effects.contains(&Effect::FetchUsers));
        let query = fetches_issues(&effects).unwrap();
        assert_eq!(query.assignee, AssigneeFilter::Me);
        assert!(query.open_only);
        assert!(app.issues_loading);
    }

    #[test]
    fn test_issues_loaded_requests_selected_detail() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();
        let effects = app.apply(ApiMessage::IssuesLoaded {
            generation: 1,
            result: Ok(page(catalog())),
        });
        assert_eq!(effects, vec![Effect::FetchIssue { id: 1 }]);
        assert_eq!(ids(&app), vec![1, 2, 3]);
        assert!(!app.issues_loading);
    }

    #[test]
    fn test_stale_issue_list_is_discarded() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();
        let effects = app.update(ch('r'));
        assert!(fetches_issues(&effects).is_some());

        app.apply(ApiMessage::IssuesLoaded {
            generation: 1,
            result: Ok(page(vec![issue(9, "Old", None, 1)])),
        });
        assert!(app.filtered_issues().is_empty());
        assert!(app.issues_loading);

        app.apply(ApiMessage::IssuesLoaded {
            generation: 2,
            result: Ok(page(catalog())),
        });
        assert_eq!(ids(&app), vec![1, 2, 3]);
    }

    #[test]
    fn test_stale_detail_is_not_displayed() {
        let mut app = loaded_app();
        let effects = app.update(ch('j'));
        assert_eq!(effects, vec![Effect::FetchIssue { id: 2 }]);

        let mut late = issue(1, "Login page broken", Some(1), 1);
        late.journals.push(Journal {
            id: 10,
            user: crate::api::types::IdName::new(1, "User 1"),
            notes: "late".to_string(),
            created_on: String::new(),
            details: Vec::new(),
        });
        app.apply(ApiMessage::IssueLoaded {
            id: 1,
            result: Ok(late),
        });

        assert_eq!(app.displayed_issue().map(|i| i.id), Some(2));
        assert!(app.detail.is_none());
        // The catalog still gets the fresher copy.
        assert_eq!(app.issues[0].journals.len(), 1);
    }

    #[test]
    fn test_detail_for_selected_issue_is_displayed() {
        let mut app = loaded_app();
        let mut full = issue(1, "Login page broken", Some(1), 1);
        full.description = "Steps to reproduce".to_string();
        app.apply(ApiMessage::IssueLoaded {
            id: 1,
            result: Ok(full),
        });
        assert_eq!(
            app.displayed_issue().map(|i| i.description.as_str()),
            Some("Steps to reproduce")
        );
    }

    #[test]
    fn test_fresh_issue_failing_filter_leaves_view() {
        let mut app = loaded_app();
        app.update(ch('f'));
        type_text(&mut app, "new");
        app.update(key(KeyCode::Enter));
        assert_eq!(ids(&app), vec![1, 2, 3]);

        let mut closed = issue(1, "Login page broken", Some(1), 1);
        closed.status = crate::api::types::IdName::new(5, "Closed");
        let effects = app.apply(ApiMessage::IssueLoaded {
            id: 1,
            result: Ok(closed),
        });

        assert_eq!(ids(&app), vec![2, 3]);
        assert!(app.filtered_issues().iter().all(|i| app.filter().matches(i)));
        assert_eq!(app.selected_issue().map(|i| i.id), Some(2));
        assert_eq!(effects, vec![Effect::FetchIssue { id: 2 }]);
    }

    #[test]
    fn test_detail_failure_for_unselected_issue_is_quiet() {
        let mut app = loaded_app();
        app.update(ch('j'));
        app.apply(ApiMessage::IssueLoaded {
            id: 1,
            result: Err("timeout".to_string()),
        });
        assert!(app.error().is_none());

        app.apply(ApiMessage::IssueLoaded {
            id: 2,
            result: Err("timeout".to_string()),
        });
        assert_eq!(app.error(), Some("Failed to load #2: timeout"));
    }

    #[test]
    fn test_projects_failure_after_picker_closed_is_silent() {
        let mut app = loaded_app();
        assert_eq!(app.update(ch('p')), vec![Effect::FetchProjects]);
        app.update(key(KeyCode::Esc));

        app.apply(ApiMessage::ProjectsLoaded(Err("timeout".to_string())));
        assert!(app.error().is_none());
        assert!(matches!(app.mode(), ViewMode::Browse));

        // Opening the picker again retries.
        assert_eq!(app.update(ch('p')), vec![Effect::FetchProjects]);
    }

    #[test]
    fn test_moving_back_does_not_refetch_same_issue_twice() {
        let mut app = loaded_app();
        assert!(app.update(ch('k')).is_empty());
    }

    #[test]
    fn test_text_filter_commit_resets_selection() {
        let mut app = loaded_app();
        app.update(ch('j'));
        assert_eq!(app.selected_index(), 1);

        app.update(ch('f'));
        assert!(matches!(app.mode(), ViewMode::TextFilterInput(_)));
        type_text(&mut app, "EXPORT");
        app.update(key(KeyCode::Enter));

        assert!(matches!(app.mode(), ViewMode::Browse));
        assert_eq!(app.filter().text, "EXPORT");
        assert_eq!(ids(&app), vec![2]);
        assert_eq!(app.selected_index(), 0);
    }

    #[test]
    fn test_text_filter_previews_and_escape_restores() {
        let mut app = loaded_app();
        app.update(ch('/'));
        type_text(&mut app, "zzz");
        assert!(app.filtered_issues().is_empty());

        app.update(key(KeyCode::Esc));
        assert!(matches!(app.mode(), ViewMode::Browse));
        assert_eq!(app.filter().text, "");
        assert_eq!(ids(&app), vec![1, 2, 3]);
    }

    #[test]
    fn test_q_is_text_in_filter_input() {
        let mut app = loaded_app();
        app.update(ch('f'));
        app.update(ch('q'));
        assert!(!app.should_quit());
        match app.mode() {
            ViewMode::TextFilterInput(input) => assert_eq!(input.value(), "q"),
            other => panic!("Expected text filter input, got {:?}", other),
        }
    }

    #[test]
    fn test_ctrl_c_quits_from_any_mode() {
        let mut app = loaded_app();
        app.update(ch('e'));
        assert!(matches!(app.mode(), ViewMode::EditSession(_)));
        app.update(ctrl('c'));
        assert!(app.should_quit());
    }

    #[test]
    fn test_q_quits_in_browse() {
        let mut app = loaded_app();
        app.update(ch('q'));
        assert!(app.should_quit());
    }

    #[test]
    fn test_user_picker_waits_for_prefetch() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();

        // The startup prefetch is still running: no second request.
        let effects = app.update(ch('u'));
        assert!(effects.is_empty());
        match app.mode() {
            ViewMode::UserPicker(picker) => assert!(picker.is_loading()),
            other => panic!("Expected user picker, got {:?}", other),
        }

        app.apply(ApiMessage::UsersLoaded(Ok(vec![user(1, "Alice")])));
        match app.mode() {
            ViewMode::UserPicker(picker) => {
                assert!(!picker.is_loading());
                assert_eq!(picker.view().len(), 1);
            }
            other => panic!("Expected user picker, got {:?}", other),
        }
    }

    #[test]
    fn test_project_picker_fetches_once_then_caches() {
        let mut app = loaded_app();
        assert_eq!(app.update(ch('p')), vec![Effect::FetchProjects]);
        app.apply(ApiMessage::ProjectsLoaded(Ok(vec![project(1, "Web")])));
        app.update(key(KeyCode::Esc));

        assert!(app.update(ch('p')).is_empty());
        match app.mode() {
            ViewMode::ProjectPicker(picker) => assert!(!picker.is_loading()),
            other => panic!("Expected project picker, got {:?}", other),
        }
    }

    #[test]
    fn test_users_arriving_after_picker_closed_are_cached_only() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();
        app.update(ch('u'));
        app.update(key(KeyCode::Esc));

        app.apply(ApiMessage::UsersLoaded(Ok(vec![user(1, "Alice")])));
        assert!(matches!(app.mode(), ViewMode::Browse));
        assert_eq!(app.users.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_confirm_single_user_refetches_with_assignee() {
        let mut app = loaded_app();
        app.update(ch('u'));
        // "Alice (alice)" sorts first.
        app.update(ch(' '));
        let effects = app.update(key(KeyCode::Enter));

        assert!(matches!(app.mode(), ViewMode::Browse));
        assert_eq!(app.filter().user_ids, BTreeSet::from([1]));
        let query = fetches_issues(&effects).unwrap();
        assert_eq!(query.assignee, AssigneeFilter::User(1));
        assert_eq!(ids(&app), vec![1]);
        assert_eq!(app.selected_index(), 0);
    }

    #[test]
    fn test_confirm_with_unchanged_query_only_refilters() {
        let mut app = loaded_app();
        app.update(ch('m'));
        assert_eq!(app.scope(), Scope::All);
        let generation = app.generation;
        app.apply(ApiMessage::IssuesLoaded {
            generation,
            result: Ok(page(catalog())),
        });

        app.update(ch('p'));
        app.apply(ApiMessage::ProjectsLoaded(Ok(vec![
            project(1, "Web"),
            project(2, "Docs"),
            project(3, "Ops"),
        ])));
        // Sorted: Docs, Ops, Web. Select Docs and Web.
        app.update(ch(' '));
        app.update(key(KeyCode::Down));
        app.update(key(KeyCode::Down));
        app.update(ch(' '));
        let effects = app.update(key(KeyCode::Enter));

        assert_eq!(app.filter().project_ids, BTreeSet::from([1, 2]));
        assert!(fetches_issues(&effects).is_none());
        assert_eq!(app.generation, generation);
        assert_eq!(ids(&app), vec![1, 2, 3]);
    }

    #[test]
    fn test_picker_escape_keeps_filters() {
        let mut app = loaded_app();
        app.update(ch('u'));
        app.update(ch(' '));
        let effects = app.update(key(KeyCode::Esc));

        assert!(effects.is_empty());
        assert!(matches!(app.mode(), ViewMode::Browse));
        assert!(app.filter().user_ids.is_empty());
    }

    #[test]
    fn test_users_failure_while_waiting_closes_picker() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();
        app.update(ch('u'));
        app.apply(ApiMessage::UsersLoaded(Err("timeout".to_string())));

        assert!(matches!(app.mode(), ViewMode::Browse));
        assert_eq!(app.error(), Some("Failed to load users: timeout"));
    }

    #[test]
    fn test_users_prefetch_failure_is_silent() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();
        app.apply(ApiMessage::UsersLoaded(Err("timeout".to_string())));
        assert!(app.error().is_none());

        // Opening the picker later retries.
        assert_eq!(app.update(ch('u')), vec![Effect::FetchUsers]);
    }

    #[test]
    fn test_fetch_error_shown_until_next_success() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();
        app.apply(ApiMessage::IssuesLoaded {
            generation: 1,
            result: Err("Network error".to_string()),
        });
        assert_eq!(app.error(), Some("Failed to load issues: Network error"));

        app.update(ch('r'));
        app.apply(ApiMessage::IssuesLoaded {
            generation: 2,
            result: Ok(page(catalog())),
        });
        assert!(app.error().is_none());
    }

    #[test]
    fn test_partial_page_flags_more_available() {
        let mut app = loaded_app();
        assert!(!app.more_available);

        let generation = app.update(ch('r')).iter().find_map(|effect| match effect {
            Effect::FetchIssues { generation, .. } => Some(*generation),
            _ => None,
        });
        let mut partial = page(catalog());
        partial.total_count = 250;
        app.apply(ApiMessage::IssuesLoaded {
            generation: generation.unwrap(),
            result: Ok(partial),
        });
        assert!(app.more_available);
        assert_eq!(app.total_count, 250);
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();
        let effects = app.apply(ApiMessage::IssuesLoaded {
            generation: 1,
            result: Ok(page(Vec::new())),
        });
        assert!(effects.is_empty());
        assert!(app.error().is_none());
        assert!(app.selected_issue().is_none());
    }

    #[test]
    fn test_scope_toggle_refetches_all_issues() {
        let mut app = loaded_app();
        let effects = app.update(ch('m'));
        assert_eq!(app.scope(), Scope::All);
        assert_eq!(fetches_issues(&effects).unwrap().assignee, AssigneeFilter::Any);
    }

    #[test]
    fn test_clear_filters() {
        let mut app = loaded_app();
        app.update(ch('f'));
        type_text(&mut app, "docs");
        app.update(key(KeyCode::Enter));
        assert_eq!(ids(&app), vec![3]);

        let effects = app.update(ch('c'));
        assert!(!app.filter().is_active());
        assert!(fetches_issues(&effects).is_none());
        assert_eq!(ids(&app), vec![1, 2, 3]);
    }

    #[test]
    fn test_edit_requires_selection() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();
        app.update(ch('e'));
        assert!(matches!(app.mode(), ViewMode::Browse));
    }

    #[test]
    fn test_edit_opens_on_selected_filtered_issue() {
        let mut app = loaded_app();
        app.update(ch('f'));
        type_text(&mut app, "docs");
        app.update(key(KeyCode::Enter));
        app.update(key(KeyCode::Enter));

        match app.mode() {
            ViewMode::EditSession(session) => assert_eq!(session.issue_id(), 3),
            other => panic!("Expected edit session, got {:?}", other),
        }
    }

    fn start_subject_edit(app: &mut App) -> Vec<Effect> {
        app.update(ch('e'));
        app.update(ctrl('u'));
        type_text(app, "Login page fixed");
        app.update(ctrl('s'))
    }

    #[test]
    fn test_save_sends_one_update_and_returns_to_browse() {
        let mut app = loaded_app();
        let effects = start_subject_edit(&mut app);

        assert!(matches!(app.mode(), ViewMode::Browse));
        match effects.as_slice() {
            [Effect::UpdateIssue { id, fields }] => {
                assert_eq!(*id, 1);
                assert_eq!(fields.len(), 1);
                assert_eq!(fields["subject"], json!("Login page fixed"));
            }
            other => panic!("Expected a single update, got {:?}", other),
        }
    }

    #[test]
    fn test_save_without_changes_sends_nothing() {
        let mut app = loaded_app();
        app.update(ch('e'));
        let effects = app.update(ctrl('s'));
        assert!(effects.is_empty());
        assert!(matches!(app.mode(), ViewMode::Browse));
    }

    #[test]
    fn test_cancel_discards_session() {
        let mut app = loaded_app();
        app.update(ch('e'));
        type_text(&mut app, "!");
        assert!(app.update(key(KeyCode::Esc)).is_empty());
        assert!(matches!(app.mode(), ViewMode::Browse));

        app.update(ch('e'));
        match app.mode() {
            ViewMode::EditSession(session) => assert!(!session.has_unsaved_changes()),
            other => panic!("Expected edit session, got {:?}", other),
        }
    }

    #[test]
    fn test_save_failure_restores_session() {
        let mut app = loaded_app();
        start_subject_edit(&mut app);

        app.apply(ApiMessage::IssueUpdated {
            id: 1,
            result: Err("Validation failed".to_string()),
        });

        match app.mode() {
            ViewMode::EditSession(session) => {
                assert_eq!(session.issue_id(), 1);
                assert_eq!(
                    session.pending()[&FieldId::Subject].text,
                    "Login page fixed"
                );
            }
            other => panic!("Expected restored edit session, got {:?}", other),
        }
        assert!(app.parked.is_empty());
    }

    #[test]
    fn test_save_failure_in_other_mode_parks_session() {
        let mut app = loaded_app();
        start_subject_edit(&mut app);
        app.update(ch('f'));

        app.apply(ApiMessage::IssueUpdated {
            id: 1,
            result: Err("Server error".to_string()),
        });
        assert!(matches!(app.mode(), ViewMode::TextFilterInput(_)));

        app.update(key(KeyCode::Esc));
        app.update(ch('e'));
        match app.mode() {
            ViewMode::EditSession(session) => {
                assert!(session.pending().contains_key(&FieldId::Subject));
            }
            other => panic!("Expected reopened edit session, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_save_survives_a_later_save() {
        let mut app = loaded_app();
        start_subject_edit(&mut app);

        app.update(ch('j'));
        app.update(ch('e'));
        app.update(ctrl('u'));
        type_text(&mut app, "Export csv");
        app.update(ctrl('s'));
        assert!(app.parked.contains_key(&1));
        assert!(app.parked.contains_key(&2));

        app.apply(ApiMessage::IssueUpdated {
            id: 1,
            result: Err("Server error".to_string()),
        });

        match app.mode() {
            ViewMode::EditSession(session) => {
                assert_eq!(session.issue_id(), 1);
                assert_eq!(
                    session.pending()[&FieldId::Subject].text,
                    "Login page fixed"
                );
            }
            other => panic!("Expected restored edit session, got {:?}", other),
        }
        assert!(app.parked[&2].in_flight);
    }

    #[test]
    fn test_parked_session_kept_while_other_issue_saves() {
        let mut app = loaded_app();
        start_subject_edit(&mut app);
        app.update(ch('f'));
        app.apply(ApiMessage::IssueUpdated {
            id: 1,
            result: Err("Server error".to_string()),
        });
        app.update(key(KeyCode::Esc));

        app.update(ch('j'));
        app.update(ch('e'));
        app.update(ctrl('u'));
        type_text(&mut app, "Export csv");
        app.update(ctrl('s'));

        app.update(ch('k'));
        app.update(ch('e'));
        match app.mode() {
            ViewMode::EditSession(session) => {
                assert_eq!(session.issue_id(), 1);
                assert!(session.pending().contains_key(&FieldId::Subject));
            }
            other => panic!("Expected reopened edit session, got {:?}", other),
        }
        assert!(app.parked.contains_key(&2));
    }

    #[test]
    fn test_edit_blocked_while_save_in_flight() {
        let mut app = loaded_app();
        start_subject_edit(&mut app);
        app.update(ch('e'));
        assert!(matches!(app.mode(), ViewMode::Browse));
        assert!(app.parked.contains_key(&1));
    }

    #[test]
    fn test_save_success_refetches_issue_and_list() {
        let mut app = loaded_app();
        start_subject_edit(&mut app);
        let generation = app.generation;

        let effects = app.apply(ApiMessage::IssueUpdated {
            id: 1,
            result: Ok(()),
        });

        assert!(effects.contains(&Effect::FetchIssue { id: 1 }));
        assert!(fetches_issues(&effects).is_some());
        assert_eq!(app.generation, generation + 1);
        assert!(app.parked.is_empty());
        assert!(matches!(app.mode(), ViewMode::Browse));
        assert!(app
            .notifications()
            .iter()
            .any(|n| n.message == "Updated #1"));
    }

    #[test]
    fn test_help_overlay_swallows_keys() {
        let mut app = loaded_app();
        app.update(ch('?'));
        assert!(app.show_help);
        assert!(app.update(ch('j')).is_empty());
        assert_eq!(app.selected_index(), 0);
        app.update(key(KeyCode::Esc));
        assert!(!app.show_help);
    }

    #[test]
    fn test_page_down_moves_by_window() {
        let mut app = App::new("https://redmine.example.com", Settings::default());
        app.init();
        let issues = (1..=30).map(|id| issue(id, "Task", None, 1)).collect();
        app.apply(ApiMessage::IssuesLoaded {
            generation: 1,
            result: Ok(page(issues)),
        });
        // 24 rows: 20 content lines fit five issues.
        app.update(Event::Resize(100, 24));
        app.update(key(KeyCode::PageDown));
        assert_eq!(app.selected_index(), 5);

        app.update(ch('G'));
        assert_eq!(app.selected_index(), 29);
        app.update(ch('g'));
        assert_eq!(app.selected_index(), 0);
    }

    #[test]
    fn test_detail_focus_scrolls_instead_of_moving() {
        let mut app = loaded_app();
        app.update(key(KeyCode::Tab));
        app.update(ch('j'));
        assert_eq!(app.selected_index(), 0);
        assert_eq!(app.detail_scroll, 1);
    }

    #[test]
    fn test_open_in_browser() {
        let mut app = loaded_app();
        assert_eq!(app.update(ch('o')), vec![Effect::OpenInBrowser { id: 1 }]);
    }

    #[test]
    fn test_banner_names_selected_users() {
        let mut app = loaded_app();
        app.filter.user_ids = BTreeSet::from([2]);
        app.filter.text = "x".to_string();
        let banner = app.banner();
        assert_eq!(banner.len(), 2);
        assert_eq!(banner[0].value, "Bob");
        assert_eq!(banner[1].value, "\"x\"");
    }
}
