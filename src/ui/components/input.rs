//! Text input component.
//!
//! A single buffer editor used for the text filter, the picker filter and
//! the edit-session field editors. The cursor counts characters, not bytes,
//! so multi-byte input edits cleanly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// A text input widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    /// The current input value.
    value: String,
    /// Cursor position, in characters.
    cursor: usize,
    /// Placeholder text shown when empty.
    placeholder: String,
}

impl TextInput {
    /// Create a new empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new input with an initial value and the cursor at the end.
    pub fn with_value(value: impl Into<String>) -> Self {
        let mut input = Self::new();
        input.set_value(value);
        input
    }

    /// Set the placeholder text.
    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    /// Get the current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Set the value and move cursor to end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    /// Clear the input.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Check if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Get the cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    /// Byte offset of a character index.
    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Insert a line break at the cursor.
    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Handle keyboard input.
    ///
    /// Returns true if the value was modified.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.insert_char(c);
                true
            }
            (KeyCode::Backspace, _) => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                    true
                } else {
                    false
                }
            }
            (KeyCode::Delete, _) => {
                if self.cursor < self.char_count() {
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                    true
                } else {
                    false
                }
            }
            (KeyCode::Left, KeyModifiers::NONE) => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            (KeyCode::Right, KeyModifiers::NONE) => {
                if self.cursor < self.char_count() {
                    self.cursor += 1;
                }
                false
            }
            (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => {
                self.cursor = 0;
                false
            }
            (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                self.cursor = self.char_count();
                false
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                if self.value.is_empty() {
                    false
                } else {
                    self.clear();
                    true
                }
            }
            (KeyCode::Char('w'), KeyModifiers::CONTROL) => self.delete_word_before_cursor(),
            _ => false,
        }
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    fn delete_word_before_cursor(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let end = self.byte_index(self.cursor);
        let before = &self.value[..end];
        let trimmed = before.trim_end_matches(|c: char| !c.is_alphanumeric());
        let word_start = trimmed
            .rfind(|c: char| !c.is_alphanumeric())
            .map(|i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);

        self.value.replace_range(word_start..end, "");
        self.cursor = self.value[..word_start].chars().count();
        true
    }

    /// Render the input field with a label in its border.
    pub fn render_with_label(&self, frame: &mut Frame, area: Rect, label: &str, focused: bool) {
        let (display, style) = if self.value.is_empty() && !self.placeholder.is_empty() {
            (self.placeholder.clone(), Style::default().fg(Color::DarkGray))
        } else if focused {
            (self.value.clone(), Style::default().fg(Color::Yellow))
        } else {
            (self.value.clone(), Style::default())
        };

        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let title_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let input = Paragraph::new(display)
            .style(style)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(input, area);

        if focused {
            let (row, col) = self.cursor_row_col();
            let cursor_x = area.x + 1 + col as u16;
            let cursor_y = area.y + 1 + row as u16;
            if cursor_x < area.right().saturating_sub(1) && cursor_y < area.bottom().saturating_sub(1)
            {
                frame.set_cursor_position(Position::new(cursor_x, cursor_y));
            }
        }
    }

    /// Line and column of the cursor in the unwrapped text.
    fn cursor_row_col(&self) -> (usize, usize) {
        let before: String = self.value.chars().take(self.cursor).collect();
        let row = before.matches('\n').count();
        let col = before
            .rsplit('\n')
            .next()
            .map_or(0, |line| line.chars().count());
        (row, col)
    }
}
