//! Issue filtering.
//!
//! Three independent inputs narrow the fetched issue catalog: a set of
//! assignee IDs, a set of project IDs and a free-text query. Dimensions are
//! combined with AND, values within a dimension with OR. An empty input
//! imposes no constraint.

use std::collections::BTreeSet;

use crate::api::types::{AssigneeFilter, Issue, IssueQuery};
use crate::config::Scope;

/// The operator's current filter inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Free-text query; empty means no text filter.
    pub text: String,
    /// Selected assignee IDs.
    pub user_ids: BTreeSet<u64>,
    /// Selected project IDs.
    pub project_ids: BTreeSet<u64>,
}

impl FilterState {
    /// Whether any dimension constrains the list.
    pub fn is_active(&self) -> bool {
        !self.text.is_empty() || !self.user_ids.is_empty() || !self.project_ids.is_empty()
    }

    /// Number of lines the filter banner above the list needs.
    ///
    /// One line per active dimension, then a separator and a blank line.
    pub fn banner_lines(&self) -> usize {
        let dimensions = [
            !self.user_ids.is_empty(),
            !self.project_ids.is_empty(),
            !self.text.is_empty(),
        ]
        .iter()
        .filter(|active| **active)
        .count();

        if dimensions == 0 {
            0
        } else {
            dimensions + 2
        }
    }

    /// Whether a single issue passes every active dimension.
    pub fn matches(&self, issue: &Issue) -> bool {
        self.matches_selection(issue) && matches_text(issue, &self.text.to_lowercase())
    }

    fn matches_selection(&self, issue: &Issue) -> bool {
        let user_ok = self.user_ids.is_empty()
            || issue
                .assignee_id()
                .is_some_and(|id| self.user_ids.contains(&id));
        let project_ok =
            self.project_ids.is_empty() || self.project_ids.contains(&issue.project.id);
        user_ok && project_ok
    }

    /// Derive the server-side query for these filters.
    ///
    /// A dimension with exactly one selected value is pushed to the server;
    /// with several values the server returns everything and the list is
    /// narrowed locally. With no user selected the scope decides.
    pub fn server_query(&self, scope: Scope, open_only: bool, page_size: u32) -> IssueQuery {
        let project_id = single(&self.project_ids);
        let assignee = match (self.user_ids.len(), single(&self.user_ids)) {
            (0, _) => match scope {
                Scope::Mine => AssigneeFilter::Me,
                Scope::All => AssigneeFilter::Any,
            },
            (_, Some(id)) => AssigneeFilter::User(id),
            _ => AssigneeFilter::Any,
        };

        IssueQuery {
            project_id,
            assignee,
            open_only,
            limit: page_size,
            offset: 0,
        }
    }
}

fn single(ids: &BTreeSet<u64>) -> Option<u64> {
    if ids.len() == 1 {
        ids.iter().next().copied()
    } else {
        None
    }
}

/// Case-insensitive substring test against the searchable issue fields.
///
/// `needle` must already be lowercase.
fn matches_text(issue: &Issue, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    contains(&issue.id.to_string())
        || contains(&issue.subject)
        || contains(&issue.status.name)
        || contains(&issue.project.name)
        || issue
            .assigned_to
            .as_ref()
            .is_some_and(|user| contains(&user.name))
}

/// Positions in `issues` that pass the filter, in their original order.
pub fn filtered_indices(issues: &[Issue], filter: &FilterState) -> Vec<usize> {
    let needle = filter.text.to_lowercase();
    issues
        .iter()
        .enumerate()
        .filter(|(_, issue)| filter.matches_selection(issue) && matches_text(issue, &needle))
        .map(|(index, _)| index)
        .collect()
}

/// The issues that pass the filter, in their original order.
pub fn compute_filtered_issues<'a>(issues: &'a [Issue], filter: &FilterState) -> Vec<&'a Issue> {
    filtered_indices(issues, filter)
        .into_iter()
        .map(|index| &issues[index])
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::types::IdName;

    pub(crate) fn issue(id: u64, subject: &str, assignee: Option<u64>, project: u64) -> Issue {
        Issue {
            id,
            project: IdName::new(project, format!("Project {}", project)),
            tracker: IdName::new(1, "Bug"),
            status: IdName::new(1, "New"),
            priority: IdName::new(2, "Normal"),
            author: IdName::new(1, "Admin"),
            assigned_to: assignee.map(|uid| IdName::new(uid, format!("User {}", uid))),
            subject: subject.to_string(),
            description: String::new(),
            start_date: None,
            due_date: None,
            done_ratio: 0,
            created_on: "2024-01-01T10:00:00Z".to_string(),
            updated_on: "2024-01-02T10:00:00Z".to_string(),
            journals: Vec::new(),
        }
    }

    fn catalog() -> Vec<Issue> {
        vec![
            issue(1, "Login page broken", Some(1), 1),
            issue(2, "Add export", Some(2), 1),
            issue(3, "Docs typo", None, 2),
        ]
    }

    fn ids(issues: &[&Issue]) -> Vec<u64> {
        issues.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let issues = catalog();
        let result = compute_filtered_issues(&issues, &FilterState::default());
        assert_eq!(ids(&result), vec![1, 2, 3]);
    }

    #[test]
    fn test_user_and_project_combined_with_and() {
        let issues = catalog();
        let filter = FilterState {
            user_ids: [1].into_iter().collect(),
            project_ids: [1].into_iter().collect(),
            ..FilterState::default()
        };
        assert_eq!(ids(&compute_filtered_issues(&issues, &filter)), vec![1]);
    }

    #[test]
    fn test_values_within_dimension_combined_with_or() {
        let issues = catalog();
        let filter = FilterState {
            user_ids: [1, 2].into_iter().collect(),
            ..FilterState::default()
        };
        assert_eq!(ids(&compute_filtered_issues(&issues, &filter)), vec![1, 2]);
    }

    #[test]
    fn test_unassigned_fails_user_dimension() {
        let issues = catalog();
        let filter = FilterState {
            user_ids: [1, 2, 3].into_iter().collect(),
            project_ids: [2].into_iter().collect(),
            ..FilterState::default()
        };
        assert!(compute_filtered_issues(&issues, &filter).is_empty());
    }

    #[test]
    fn test_text_matches_any_field_case_insensitively() {
        let issues = catalog();
        let by_text = |text: &str| {
            let filter = FilterState {
                text: text.to_string(),
                ..FilterState::default()
            };
            ids(&compute_filtered_issues(&issues, &filter))
        };

        assert_eq!(by_text("LOGIN"), vec![1]);
        assert_eq!(by_text("3"), vec![3]);
        assert_eq!(by_text("project 2"), vec![3]);
        assert_eq!(by_text("user 2"), vec![2]);
        assert_eq!(by_text("new"), vec![1, 2, 3]);
        assert!(by_text("unassigned").is_empty());
    }

    #[test]
    fn test_text_and_selection_combined() {
        let issues = catalog();
        let filter = FilterState {
            text: "export".to_string(),
            project_ids: [1].into_iter().collect(),
            ..FilterState::default()
        };
        assert_eq!(ids(&compute_filtered_issues(&issues, &filter)), vec![2]);
    }

    #[test]
    fn test_output_preserves_order_and_satisfies_constraints() {
        let issues: Vec<Issue> = (1..=20)
            .map(|id| issue(id, &format!("Task {}", id), Some(id % 3), id % 4))
            .collect();
        let filter = FilterState {
            text: "1".to_string(),
            user_ids: [1, 2].into_iter().collect(),
            project_ids: [1, 3].into_iter().collect(),
        };

        let indices = filtered_indices(&issues, &filter);
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        for (index, issue) in issues.iter().enumerate() {
            assert_eq!(indices.contains(&index), filter.matches(issue));
        }
    }

    #[test]
    fn test_banner_lines() {
        let mut filter = FilterState::default();
        assert_eq!(filter.banner_lines(), 0);

        filter.text = "x".to_string();
        assert_eq!(filter.banner_lines(), 3);

        filter.user_ids.insert(1);
        filter.project_ids.insert(2);
        assert_eq!(filter.banner_lines(), 5);
    }

    #[test]
    fn test_server_query_single_values_pushed_to_server() {
        let filter = FilterState {
            user_ids: [7].into_iter().collect(),
            project_ids: [3].into_iter().collect(),
            ..FilterState::default()
        };
        let query = filter.server_query(Scope::Mine, true, 50);
        assert_eq!(query.project_id, Some(3));
        assert_eq!(query.assignee, AssigneeFilter::User(7));
        assert_eq!(query.limit, 50);
    }

    #[test]
    fn test_server_query_multiple_values_filtered_locally() {
        let filter = FilterState {
            user_ids: [7, 8].into_iter().collect(),
            project_ids: [3, 4].into_iter().collect(),
            ..FilterState::default()
        };
        let query = filter.server_query(Scope::Mine, true, 100);
        assert_eq!(query.project_id, None);
        assert_eq!(query.assignee, AssigneeFilter::Any);
    }

    #[test]
    fn test_server_query_scope_without_users() {
        let filter = FilterState::default();
        assert_eq!(
            filter.server_query(Scope::Mine, true, 100).assignee,
            AssigneeFilter::Me
        );
        assert_eq!(
            filter.server_query(Scope::All, true, 100).assignee,
            AssigneeFilter::Any
        );
    }
}
