//! Help overlay listing keyboard shortcuts.
//!
//! Opened with '?' from the issue list and closed with '?', 'q' or Escape.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::components::centered_rect;
use crate::ui::theme::theme;

/// Shortcuts grouped by the mode they apply to.
pub const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Issue list",
        &[
            ("j / ↓", "Next issue"),
            ("k / ↑", "Previous issue"),
            ("PgDn / PgUp", "Jump a page"),
            ("g / G", "First / last issue"),
            ("Tab", "Switch between list and details"),
            ("e / Enter", "Edit selected issue"),
            ("f / /", "Filter by text"),
            ("u", "Filter by assignee"),
            ("p", "Filter by project"),
            ("c", "Clear all filters"),
            ("m", "Toggle my issues / all issues"),
            ("r", "Reload issues"),
            ("o", "Open issue in browser"),
            ("?", "Toggle this help"),
            ("q / Ctrl+C", "Quit"),
        ],
    ),
    (
        "Pickers",
        &[
            ("Type", "Narrow the list"),
            ("↑ / ↓", "Move cursor"),
            ("Space", "Toggle selection"),
            ("Enter", "Apply selection"),
            ("Esc", "Close without changes"),
        ],
    ),
    (
        "Text filter",
        &[("Enter", "Apply filter"), ("Esc", "Restore previous filter")],
    ),
    (
        "Editing",
        &[
            ("Tab / Enter", "Next field"),
            ("Shift+Tab", "Previous field"),
            ("↑ / ↓", "Cycle choices of a list field"),
            ("Ctrl+J", "New line in description"),
            ("Ctrl+S", "Save all changes"),
            ("Esc", "Discard changes"),
        ],
    ),
];

fn help_lines() -> Vec<Line<'static>> {
    let t = theme();
    let mut lines = Vec::new();
    for (title, bindings) in SECTIONS {
        lines.push(Line::styled(*title, t.heading()));
        for (key, action) in bindings.iter() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:<14}", key),
                    Style::default()
                        .fg(t.active_border)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(*action),
            ]));
        }
        lines.push(Line::raw(""));
    }
    lines
}

/// Render the help overlay on top of `area`.
pub fn render(frame: &mut Frame, area: Rect) {
    let lines = help_lines();
    let height = (lines.len() as u16 + 2).min(area.height);
    let popup = centered_rect(area, 60, height);

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .title_bottom(Line::from(" ?/q/Esc: Close ").alignment(Alignment::Center))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme().active_border));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}
