//! Multi-select picker used to choose users and projects.
//!
//! The picker keeps a read-only snapshot of candidate items and a working
//! copy of the selected IDs. Every keystroke rebuilds the visible list:
//! selected items first, then unselected items that match the filter text,
//! each group sorted by label.

use std::collections::BTreeSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use super::TextInput;

/// Maximum number of rows shown at once in the overlay.
pub const MAX_VISIBLE_ITEMS: usize = 12;

/// A candidate in a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    /// The unique identifier for this item.
    pub id: u64,
    /// The display label for this item.
    pub label: String,
}

impl SelectItem {
    /// Create a new select item.
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// One row of the built list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: u64,
    pub label: String,
    /// Derived from the selected-ID set at build time.
    pub selected: bool,
    /// Position of this item in the source snapshot.
    pub source_index: usize,
}

/// Result of building the visible picker list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredList {
    /// Selected entries, then unselected entries.
    pub entries: Vec<ListEntry>,
    /// Cursor clamped into the list, `None` when the list is empty.
    pub cursor: Option<usize>,
}

impl FilteredList {
    /// Map a position in the built list back to the source snapshot.
    pub fn source_index(&self, filtered_index: usize) -> Option<usize> {
        self.entries.get(filtered_index).map(|e| e.source_index)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the visible list for a picker.
///
/// Selected items are never hidden by `filter`. Unselected items are kept
/// when their label contains `filter`, ignoring case. Both groups are
/// sorted by label (ordinal) and the selected group comes first.
pub fn build_filtered_list(
    items: &[SelectItem],
    selected: &BTreeSet<u64>,
    filter: &str,
    cursor: usize,
) -> FilteredList {
    let needle = filter.to_lowercase();

    let (mut chosen, mut rest): (Vec<ListEntry>, Vec<ListEntry>) = items
        .iter()
        .enumerate()
        .map(|(source_index, item)| ListEntry {
            id: item.id,
            label: item.label.clone(),
            selected: selected.contains(&item.id),
            source_index,
        })
        .filter(|entry| entry.selected || entry.label.to_lowercase().contains(&needle))
        .partition(|entry| entry.selected);

    chosen.sort_by(|a, b| a.label.cmp(&b.label));
    rest.sort_by(|a, b| a.label.cmp(&b.label));
    chosen.append(&mut rest);

    let cursor = if chosen.is_empty() {
        None
    } else {
        Some(cursor.min(chosen.len() - 1))
    };

    FilteredList {
        entries: chosen,
        cursor,
    }
}

/// Range of rows to show so that `cursor` stays near the middle.
pub fn visible_range(len: usize, cursor: usize, max_visible: usize) -> (usize, usize) {
    if len <= max_visible {
        return (0, len);
    }
    let start = cursor.saturating_sub(max_visible / 2).min(len - max_visible);
    (start, start + max_visible)
}

/// What the caller should do after a key was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiSelectAction {
    /// Commit the working selection.
    Confirm(BTreeSet<u64>),
    /// Discard the working selection.
    Cancel,
}

/// An open picker overlay.
#[derive(Debug, Clone)]
pub struct MultiSelect {
    title: String,
    /// Candidate snapshot; `None` while it is being fetched.
    items: Option<Vec<SelectItem>>,
    /// Working copy of the selection.
    selected: BTreeSet<u64>,
    filter: TextInput,
    cursor: usize,
    view: FilteredList,
}

impl MultiSelect {
    /// Open a picker in the loading state.
    pub fn new(title: impl Into<String>, selected: BTreeSet<u64>) -> Self {
        let mut filter = TextInput::new();
        filter.set_placeholder("Type to filter...");
        Self {
            title: title.into(),
            items: None,
            selected,
            filter,
            cursor: 0,
            view: FilteredList::default(),
        }
    }

    /// Install the candidate snapshot.
    pub fn set_items(&mut self, items: Vec<SelectItem>) {
        self.items = Some(items);
        self.cursor = 0;
        self.rebuild();
    }

    /// Whether the candidate list has not arrived yet.
    pub fn is_loading(&self) -> bool {
        self.items.is_none()
    }

    /// The working selection.
    pub fn selected(&self) -> &BTreeSet<u64> {
        &self.selected
    }

    /// The current filter text.
    pub fn filter_text(&self) -> &str {
        self.filter.value()
    }

    /// The built list.
    pub fn view(&self) -> &FilteredList {
        &self.view
    }

    fn rebuild(&mut self) {
        let items = self.items.as_deref().unwrap_or_default();
        self.view = build_filtered_list(items, &self.selected, self.filter.value(), self.cursor);
        self.cursor = self.view.cursor.unwrap_or(0);
    }

    /// Flip the selection of the item under the cursor.
    pub fn toggle_current(&mut self) {
        let Some(cursor) = self.view.cursor else {
            return;
        };
        let id = match (self.items.as_deref(), self.view.source_index(cursor)) {
            (Some(items), Some(index)) => items[index].id,
            _ => return,
        };
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        self.rebuild();
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
        self.rebuild();
    }

    pub fn move_down(&mut self) {
        self.cursor += 1;
        self.rebuild();
    }

    /// Handle keyboard input.
    ///
    /// Printable characters edit the filter; Space toggles.
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<MultiSelectAction> {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return Some(MultiSelectAction::Cancel),
            (KeyCode::Enter, _) => {
                return Some(MultiSelectAction::Confirm(self.selected.clone()));
            }
            (KeyCode::Up, _) => self.move_up(),
            (KeyCode::Down, _) => self.move_down(),
            (KeyCode::PageUp, _) => {
                self.cursor = self.cursor.saturating_sub(MAX_VISIBLE_ITEMS);
                self.rebuild();
            }
            (KeyCode::PageDown, _) => {
                self.cursor += MAX_VISIBLE_ITEMS;
                self.rebuild();
            }
            (KeyCode::Char(' '), KeyModifiers::NONE) => self.toggle_current(),
            _ => {
                if self.filter.handle_input(key) {
                    self.rebuild();
                }
            }
        }
        None
    }

    /// Render the picker as a centered overlay.
    pub fn render(&self, frame: &mut Frame, area: Rect, accent: Color) {
        let rows = if self.is_loading() {
            4
        } else {
            self.view.len().clamp(1, MAX_VISIBLE_ITEMS) as u16 + 6
        };
        let overlay = centered_rect(area, area.width.saturating_sub(8).min(90), rows + 2);
        frame.render_widget(Clear, overlay);

        let title = if self.selected.is_empty() {
            format!(" {} ", self.title)
        } else {
            format!(" {} ({}) ", self.title, self.selected.len())
        };
        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ))
            .title_bottom(Line::from(
                " ↑/↓: Navigate  Space: Toggle  Enter: Apply  Esc: Cancel ",
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent));

        let lines = if self.is_loading() {
            vec![
                Line::raw(""),
                Line::styled(
                    format!("Loading {}...", self.title.to_lowercase()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]
        } else {
            self.content_lines()
        };

        frame.render_widget(Paragraph::new(lines).block(block), overlay);
    }

    fn content_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Filter: ", Style::default().fg(Color::DarkGray)),
                Span::raw(self.filter.value().to_string()),
                Span::styled("▏", Style::default().fg(Color::Yellow)),
            ]),
            Line::raw(""),
        ];

        if self.view.is_empty() {
            let message = if self.items.as_ref().is_some_and(|items| items.is_empty()) {
                "Nothing to choose from"
            } else {
                "No matching items"
            };
            lines.push(Line::styled(message, Style::default().fg(Color::DarkGray)));
            return lines;
        }

        let cursor = self.view.cursor.unwrap_or(0);
        let (start, end) = visible_range(self.view.len(), cursor, MAX_VISIBLE_ITEMS);
        for (index, entry) in self.view.entries[start..end].iter().enumerate() {
            let is_cursor = start + index == cursor;
            let marker = if is_cursor { "→ " } else { "  " };
            let checkbox = if entry.selected { "[✓]" } else { "[ ]" };
            let mut style = if entry.selected {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            if is_cursor {
                style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
            }
            lines.push(Line::styled(
                format!("{}{} {}", marker, checkbox, entry.label),
                style,
            ));
        }

        if self.view.len() > MAX_VISIBLE_ITEMS {
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                format!("Showing {}-{} of {}", start + 1, end, self.view.len()),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines
    }
}

/// A rectangle of the given size centered in `area`.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
