//! The editable issue fields and how their text values map to the wire.

use chrono::NaiveDate;
use serde_json::Value;

use crate::api::types::{Issue, IssueStatus, Priority, User, UNASSIGNED};

/// Where a `select` field gets its options from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    Statuses,
    Priorities,
    /// "Unassigned" followed by every known user.
    Assignees,
}

/// How a field is edited and validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Multiline,
    /// Integer from 0 to 100.
    Number,
    /// `YYYY-MM-DD` or empty.
    Date,
    Select(OptionSource),
}

/// Identifies an editable field. Also the key of the edit-session maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    Subject,
    Description,
    Status,
    Priority,
    Assignee,
    Progress,
    DueDate,
}

impl FieldId {
    /// Key of this field in the update payload.
    pub fn wire_name(self) -> &'static str {
        match self {
            FieldId::Subject => "subject",
            FieldId::Description => "description",
            FieldId::Status => "status_id",
            FieldId::Priority => "priority_id",
            FieldId::Assignee => "assigned_to_id",
            FieldId::Progress => "done_ratio",
            FieldId::DueDate => "due_date",
        }
    }
}

/// One entry of the editable-field table.
#[derive(Clone, Copy)]
pub struct EditableField {
    pub id: FieldId,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Reads the field's display value from an issue.
    pub read: fn(&Issue) -> String,
}

/// Editable fields in focus order.
pub const EDITABLE_FIELDS: [EditableField; 7] = [
    EditableField {
        id: FieldId::Subject,
        label: "Subject",
        kind: FieldKind::Text,
        read: |issue| issue.subject.clone(),
    },
    EditableField {
        id: FieldId::Description,
        label: "Description",
        kind: FieldKind::Multiline,
        read: |issue| issue.description.clone(),
    },
    EditableField {
        id: FieldId::Status,
        label: "Status",
        kind: FieldKind::Select(OptionSource::Statuses),
        read: |issue| issue.status.name.clone(),
    },
    EditableField {
        id: FieldId::Priority,
        label: "Priority",
        kind: FieldKind::Select(OptionSource::Priorities),
        read: |issue| issue.priority.name.clone(),
    },
    EditableField {
        id: FieldId::Assignee,
        label: "Assigned To",
        kind: FieldKind::Select(OptionSource::Assignees),
        read: |issue| issue.assignee_name().to_string(),
    },
    EditableField {
        id: FieldId::Progress,
        label: "Progress",
        kind: FieldKind::Number,
        read: |issue| issue.done_ratio.to_string(),
    },
    EditableField {
        id: FieldId::DueDate,
        label: "Due Date",
        kind: FieldKind::Date,
        read: |issue| issue.due_date_text().to_string(),
    },
];

/// Look up a field's table entry.
pub fn field(id: FieldId) -> &'static EditableField {
    // The table holds every FieldId exactly once, in declaration order.
    &EDITABLE_FIELDS[id as usize]
}

/// Reference data needed to offer and resolve `select` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditOptions<'a> {
    pub statuses: &'a [IssueStatus],
    pub priorities: &'a [Priority],
    pub users: &'a [User],
}

impl<'a> EditOptions<'a> {
    /// Display values offered for a select field.
    pub fn options(&self, source: OptionSource) -> Vec<String> {
        match source {
            OptionSource::Statuses => self.statuses.iter().map(|s| s.name.clone()).collect(),
            OptionSource::Priorities => self.priorities.iter().map(|p| p.name.clone()).collect(),
            OptionSource::Assignees => std::iter::once(UNASSIGNED.to_string())
                .chain(self.users.iter().map(User::display_name))
                .collect(),
        }
    }

    /// Resolve a select display value to its wire value.
    fn resolve(&self, source: OptionSource, value: &str) -> Option<Value> {
        match source {
            OptionSource::Statuses => self
                .statuses
                .iter()
                .find(|s| s.name == value)
                .map(|s| Value::from(s.id)),
            OptionSource::Priorities => self
                .priorities
                .iter()
                .find(|p| p.name == value)
                .map(|p| Value::from(p.id)),
            OptionSource::Assignees if value == UNASSIGNED => Some(Value::Null),
            OptionSource::Assignees => self
                .users
                .iter()
                .find(|u| u.display_name() == value)
                .map(|u| Value::from(u.id)),
        }
    }

    /// Convert a field's text value to its wire value.
    ///
    /// Returns `None` when the value is invalid for the field.
    pub fn coerce(&self, id: FieldId, value: &str) -> Option<Value> {
        if id == FieldId::Subject && value.trim().is_empty() {
            return None;
        }

        match field(id).kind {
            FieldKind::Text | FieldKind::Multiline => Some(Value::from(value)),
            FieldKind::Number => value
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|ratio| *ratio <= 100)
                .map(Value::from),
            FieldKind::Date if value.trim().is_empty() => Some(Value::Null),
            FieldKind::Date => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .ok()
                .map(|date| Value::from(date.format("%Y-%m-%d").to_string())),
            FieldKind::Select(source) => self.resolve(source, value),
        }
    }
}
