//! Multi-field edit session for a single issue.
//!
//! The session remembers every field's value at open time and records a
//! pending edit only for fields whose value differs from that snapshot.
//! Reverting a field removes its pending edit. Saving turns the pending
//! edits into one update payload.

use std::collections::BTreeMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Value;
use tracing::debug;

use super::fields::{field, EditOptions, EditableField, FieldId, FieldKind, EDITABLE_FIELDS};
use crate::api::types::{Issue, IssueUpdate};
use crate::ui::components::TextInput;

/// A changed field: the text the operator entered and its wire value.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    pub text: String,
    pub value: Value,
}

/// What the caller should do after a key was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    /// Keep editing.
    Continue,
    /// Submit this payload.
    Save(IssueUpdate),
    /// Save requested with no changes; close the session.
    NothingToSave,
    /// Discard the session.
    Cancel,
}

/// An in-progress edit of one issue.
#[derive(Debug, Clone)]
pub struct EditSession {
    issue_id: u64,
    original: BTreeMap<FieldId, String>,
    pending: BTreeMap<FieldId, PendingEdit>,
    active: usize,
    editor: TextInput,
}

impl EditSession {
    /// Open a session on `issue` with focus on the first field.
    pub fn open(issue: &Issue) -> Self {
        let original: BTreeMap<FieldId, String> = EDITABLE_FIELDS
            .iter()
            .map(|f| (f.id, (f.read)(issue)))
            .collect();
        let editor = TextInput::with_value(original[&EDITABLE_FIELDS[0].id].clone());

        debug!(issue_id = issue.id, "Edit session opened");
        Self {
            issue_id: issue.id,
            original,
            pending: BTreeMap::new(),
            active: 0,
            editor,
        }
    }

    pub fn issue_id(&self) -> u64 {
        self.issue_id
    }

    /// Index of the focused field in [`EDITABLE_FIELDS`].
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_field(&self) -> &'static EditableField {
        &EDITABLE_FIELDS[self.active]
    }

    /// The focused field's editor.
    pub fn editor(&self) -> &TextInput {
        &self.editor
    }

    /// Value of a field when the session opened.
    pub fn original(&self, id: FieldId) -> &str {
        self.original.get(&id).map_or("", String::as_str)
    }

    /// Fields recorded as changed.
    pub fn pending(&self) -> &BTreeMap<FieldId, PendingEdit> {
        &self.pending
    }

    /// Value to show for a field: live editor text for the focused field,
    /// otherwise the pending value, otherwise the original.
    pub fn display_value(&self, id: FieldId) -> &str {
        if id == self.active_field().id {
            return self.editor.value();
        }
        self.pending
            .get(&id)
            .map_or_else(|| self.original(id), |edit| edit.text.as_str())
    }

    /// Whether a field differs from its original value.
    pub fn is_dirty(&self, id: FieldId) -> bool {
        if id == self.active_field().id {
            self.editor.value() != self.original(id)
        } else {
            self.pending.contains_key(&id)
        }
    }

    /// True when there are pending edits or the focused field was changed.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.pending.is_empty() || self.editor.value() != self.original(self.active_field().id)
    }

    /// Record the focused field's editor value against the snapshot.
    ///
    /// Unchanged or invalid values are removed from the pending edits.
    pub fn commit_current(&mut self, options: &EditOptions) {
        let id = self.active_field().id;
        let text = self.editor.value();

        let coerced = if text == self.original(id) {
            None
        } else {
            options.coerce(id, text)
        };

        match coerced {
            Some(value) => {
                self.pending.insert(
                    id,
                    PendingEdit {
                        text: text.to_string(),
                        value,
                    },
                );
            }
            None => {
                self.pending.remove(&id);
            }
        }
    }

    /// Commit the focused field and move focus forward, wrapping around.
    pub fn next_field(&mut self, options: &EditOptions) {
        self.focus((self.active + 1) % EDITABLE_FIELDS.len(), options);
    }

    /// Commit the focused field and move focus backward, wrapping around.
    pub fn prev_field(&mut self, options: &EditOptions) {
        let len = EDITABLE_FIELDS.len();
        self.focus((self.active + len - 1) % len, options);
    }

    fn focus(&mut self, index: usize, options: &EditOptions) {
        self.commit_current(options);
        self.active = index;

        let id = self.active_field().id;
        let value = self
            .pending
            .get(&id)
            .map_or_else(|| self.original(id).to_string(), |edit| edit.text.clone());
        self.editor.set_value(value);
    }

    /// Step a select field through its options.
    pub fn cycle_option(&mut self, options: &EditOptions, forward: bool) {
        let FieldKind::Select(source) = self.active_field().kind else {
            return;
        };
        let choices = options.options(source);
        if choices.is_empty() {
            return;
        }

        let len = choices.len();
        let next = match choices.iter().position(|c| c == self.editor.value()) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.editor.set_value(choices[next].clone());
    }

    /// Commit the focused field and build the update payload.
    ///
    /// Returns `None` when nothing changed. The payload has exactly one
    /// key per pending edit.
    pub fn build_payload(&mut self, options: &EditOptions) -> Option<IssueUpdate> {
        self.commit_current(options);
        if self.pending.is_empty() {
            return None;
        }

        Some(
            self.pending
                .iter()
                .map(|(id, edit)| (id.wire_name().to_string(), edit.value.clone()))
                .collect(),
        )
    }

    /// Handle a key while editing.
    pub fn handle_key(&mut self, key: KeyEvent, options: &EditOptions) -> EditAction {
        let kind = self.active_field().kind;

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return EditAction::Cancel,
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => {
                return match self.build_payload(options) {
                    Some(payload) => EditAction::Save(payload),
                    None => EditAction::NothingToSave,
                };
            }
            (KeyCode::Tab, _) | (KeyCode::Enter, _) => self.next_field(options),
            (KeyCode::BackTab, _) => self.prev_field(options),
            (KeyCode::Up, _) if matches!(kind, FieldKind::Select(_)) => {
                self.cycle_option(options, false)
            }
            (KeyCode::Down, _) if matches!(kind, FieldKind::Select(_)) => {
                self.cycle_option(options, true)
            }
            (KeyCode::Char('j'), KeyModifiers::CONTROL) if kind == FieldKind::Multiline => {
                self.editor.insert_newline()
            }
            // Select values only change through the option list.
            _ if matches!(kind, FieldKind::Select(_)) => {}
            _ => {
                self.editor.handle_input(key);
            }
        }
        EditAction::Continue
    }

    /// Label and old/new text of every pending edit, in field order.
    pub fn change_summary(&self) -> Vec<(&'static str, &str, &str)> {
        self.pending
            .iter()
            .map(|(id, edit)| (field(*id).label, self.original(*id), edit.text.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{IdName, IssueStatus};
    use crate::filter::tests::issue;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(session: &mut EditSession, text: &str) {
        for c in text.chars() {
            session.handle_key(key(KeyCode::Char(c)), &EditOptions::default());
        }
    }

    fn clear(session: &mut EditSession) {
        session.handle_key(ctrl('u'), &EditOptions::default());
    }

    fn sample() -> Issue {
        let mut issue = issue(7, "A", Some(1), 1);
        issue.status = IdName::new(1, "New");
        issue.done_ratio = 20;
        issue
    }

    #[test]
    fn test_open_snapshots_fields() {
        let session = EditSession::open(&sample());
        assert_eq!(session.issue_id(), 7);
        assert_eq!(session.active_index(), 0);
        assert_eq!(session.editor().value(), "A");
        assert_eq!(session.original(FieldId::Progress), "20");
        assert_eq!(session.original(FieldId::Assignee), "User 1");
        assert!(session.pending().is_empty());
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_revert_then_save_sends_nothing() {
        let opts = EditOptions::default();
        let mut session = EditSession::open(&sample());

        clear(&mut session);
        type_text(&mut session, "B");
        session.handle_key(key(KeyCode::Tab), &opts);
        assert!(session.pending().contains_key(&FieldId::Subject));

        session.handle_key(key(KeyCode::BackTab), &opts);
        assert_eq!(session.editor().value(), "B");
        clear(&mut session);
        type_text(&mut session, "A");

        assert_eq!(session.handle_key(ctrl('s'), &opts), EditAction::NothingToSave);
        assert!(session.pending().is_empty());
    }

    #[test]
    fn test_switch_is_idempotent() {
        let opts = EditOptions::default();
        let mut session = EditSession::open(&sample());
        clear(&mut session);
        type_text(&mut session, "Renamed");
        session.next_field(&opts);

        let before = session.pending().clone();
        session.prev_field(&opts);
        session.next_field(&opts);
        assert_eq!(session.pending(), &before);
        assert_eq!(session.pending().len(), 1);
    }

    #[test]
    fn test_focus_wraps_around() {
        let opts = EditOptions::default();
        let mut session = EditSession::open(&sample());
        session.prev_field(&opts);
        assert_eq!(session.active_field().id, FieldId::DueDate);
        session.next_field(&opts);
        assert_eq!(session.active_field().id, FieldId::Subject);
    }

    #[test]
    fn test_payload_keys_match_pending_edits() {
        let statuses = vec![
            IssueStatus {
                id: 1,
                name: "New".to_string(),
                is_closed: false,
            },
            IssueStatus {
                id: 3,
                name: "Resolved".to_string(),
                is_closed: false,
            },
        ];
        let opts = EditOptions {
            statuses: &statuses,
            ..EditOptions::default()
        };
        let mut session = EditSession::open(&sample());

        clear(&mut session);
        type_text(&mut session, "New subject");
        session.next_field(&opts); // description
        session.next_field(&opts); // status
        session.handle_key(key(KeyCode::Down), &opts);
        assert_eq!(session.editor().value(), "Resolved");
        session.next_field(&opts); // priority
        session.next_field(&opts); // assignee
        session.next_field(&opts); // progress
        clear(&mut session);
        type_text(&mut session, "60");

        let pending_keys: Vec<&str> = session.pending().keys().map(|id| id.wire_name()).collect();
        assert_eq!(pending_keys, vec!["subject", "status_id"]);

        match session.handle_key(ctrl('s'), &opts) {
            EditAction::Save(payload) => {
                assert_eq!(payload.len(), session.pending().len());
                assert_eq!(payload["subject"], json!("New subject"));
                assert_eq!(payload["status_id"], json!(3));
                assert_eq!(payload["done_ratio"], json!(60));
                for id in session.pending().keys() {
                    assert!(payload.contains_key(id.wire_name()));
                }
            }
            other => panic!("Expected Save, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_progress_not_pending() {
        let opts = EditOptions::default();
        let mut session = EditSession::open(&sample());
        for _ in 0..5 {
            session.next_field(&opts);
        }
        assert_eq!(session.active_field().id, FieldId::Progress);

        clear(&mut session);
        type_text(&mut session, "150");
        assert!(session.has_unsaved_changes());
        session.next_field(&opts);
        assert!(!session.pending().contains_key(&FieldId::Progress));
        assert!(session.build_payload(&opts).is_none());
    }

    #[test]
    fn test_invalid_value_replaces_earlier_valid_edit() {
        let opts = EditOptions::default();
        let mut session = EditSession::open(&sample());
        for _ in 0..6 {
            session.next_field(&opts);
        }
        assert_eq!(session.active_field().id, FieldId::DueDate);

        type_text(&mut session, "2024-05-01");
        session.prev_field(&opts);
        assert!(session.pending().contains_key(&FieldId::DueDate));

        session.next_field(&opts);
        type_text(&mut session, "x");
        session.prev_field(&opts);
        assert!(!session.pending().contains_key(&FieldId::DueDate));
    }

    #[test]
    fn test_select_ignores_typing() {
        let opts = EditOptions::default();
        let mut session = EditSession::open(&sample());
        session.next_field(&opts);
        session.next_field(&opts);
        assert_eq!(session.active_field().id, FieldId::Status);

        type_text(&mut session, "zzz");
        assert_eq!(session.editor().value(), "New");
    }

    #[test]
    fn test_multiline_newline() {
        let opts = EditOptions::default();
        let mut session = EditSession::open(&sample());
        session.next_field(&opts);
        type_text(&mut session, "one");
        session.handle_key(ctrl('j'), &opts);
        type_text(&mut session, "two");
        assert_eq!(session.editor().value(), "one\ntwo");
    }

    #[test]
    fn test_display_value_and_dirty_flags() {
        let opts = EditOptions::default();
        let mut session = EditSession::open(&sample());
        clear(&mut session);
        type_text(&mut session, "Z");
        assert!(session.is_dirty(FieldId::Subject));
        assert_eq!(session.display_value(FieldId::Subject), "Z");

        session.next_field(&opts);
        assert_eq!(session.display_value(FieldId::Subject), "Z");
        assert!(session.is_dirty(FieldId::Subject));
        assert!(!session.is_dirty(FieldId::Description));
        assert_eq!(session.change_summary(), vec![("Subject", "A", "Z")]);
    }

    #[test]
    fn test_escape_cancels() {
        let mut session = EditSession::open(&sample());
        assert_eq!(
            session.handle_key(key(KeyCode::Esc), &EditOptions::default()),
            EditAction::Cancel
        );
    }
}
