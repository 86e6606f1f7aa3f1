//! Issue list pane.
//!
//! Each issue takes a fixed number of lines. The visible slice is chosen so
//! the selected issue stays centered, and an optional filter banner above
//! the list shrinks the space available for issues.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::api::types::Issue;
use crate::ui::components::LoadingIndicator;
use crate::ui::theme::theme;

/// Lines used by one issue entry, including its spacer.
pub const LINES_PER_ISSUE: usize = 4;

/// Number of issues that fit in `content_lines` below a banner of
/// `banner_lines`. Always at least one.
pub fn window_size(content_lines: usize, banner_lines: usize) -> usize {
    // The last entry's spacer may fall outside the pane.
    ((content_lines.saturating_sub(banner_lines) + 1) / LINES_PER_ISSUE).max(1)
}

/// Visible `[start, end)` slice of a list of `total` items.
///
/// Near the top the window is pinned to the start, near the bottom to the
/// end; otherwise the selected item sits in the middle.
pub fn compute_window(total: usize, selected: usize, window: usize) -> (usize, usize) {
    let half = window / 2;
    let start = if selected < half {
        0
    } else if selected >= total.saturating_sub(half) {
        total.saturating_sub(window)
    } else {
        selected - half
    };
    (start, total.min(start + window))
}

/// One active filter dimension shown above the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerEntry {
    pub label: &'static str,
    pub value: String,
}

/// Everything the list pane needs to draw itself.
pub struct IssueListProps<'a> {
    /// Filtered issues, in display order.
    pub issues: Vec<&'a Issue>,
    pub selected: usize,
    /// Number of issues fetched before filtering.
    pub loaded: usize,
    pub banner: Vec<BannerEntry>,
    pub loading: bool,
    pub spinner: &'a LoadingIndicator,
    pub focused: bool,
}

/// Pane title with position and filter counters.
fn title(props: &IssueListProps) -> String {
    let shown = props.issues.len();
    if shown == 0 {
        return " Issues ".to_string();
    }
    if props.banner.is_empty() {
        format!(" Issues ({}/{}) ", props.selected + 1, shown)
    } else {
        format!(
            " Issues ({}/{}, {} of {} shown) ",
            props.selected + 1,
            shown,
            shown,
            props.loaded
        )
    }
}

fn banner_lines(banner: &[BannerEntry], width: usize) -> Vec<Line<'static>> {
    if banner.is_empty() {
        return Vec::new();
    }
    let t = theme();
    let mut lines: Vec<Line<'static>> = banner
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(format!("{}: ", entry.label), t.heading()),
                Span::raw(entry.value.clone()),
            ])
        })
        .collect();
    lines.push(Line::styled("─".repeat(width), Style::default().fg(t.dim)));
    lines.push(Line::raw(""));
    lines
}

fn issue_lines(issue: &Issue, selected: bool) -> Vec<Line<'static>> {
    let t = theme();
    let marker = if selected { "▶ " } else { "  " };
    let subject_style = if selected {
        Style::default()
            .fg(t.active_border)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let meta = Style::default().fg(t.dim);

    vec![
        Line::from(vec![
            Span::styled(marker, subject_style),
            Span::styled(format!("#{} ", issue.id), Style::default().fg(t.warning)),
            Span::styled(issue.subject.clone(), subject_style),
        ]),
        Line::styled(
            format!(
                "  {} · {} · {}",
                issue.status.name, issue.priority.name, issue.project.name
            ),
            meta,
        ),
        Line::styled(
            format!(
                "  {} · updated {}",
                issue.assignee_name(),
                Issue::short_timestamp(&issue.updated_on)
            ),
            meta,
        ),
        Line::raw(""),
    ]
}

/// Render the issue list pane.
pub fn render(frame: &mut Frame, area: Rect, props: &IssueListProps) {
    let t = theme();
    let block = Block::default()
        .title(title(props))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(t.pane_border(props.focused));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = banner_lines(&props.banner, inner.width as usize);

    if props.loading && props.issues.is_empty() {
        lines.push(Line::styled(
            props.spinner.text("Loading issues..."),
            Style::default().fg(t.active_border),
        ));
    } else if props.issues.is_empty() {
        let message = if props.banner.is_empty() {
            "No issues found"
        } else {
            "No issues match the current filters"
        };
        lines.push(Line::styled(message, Style::default().fg(t.dim)));
    } else {
        let window = window_size(inner.height as usize, lines.len());
        let (start, end) = compute_window(props.issues.len(), props.selected, window);
        for (offset, issue) in props.issues[start..end].iter().enumerate() {
            lines.extend(issue_lines(issue, start + offset == props.selected));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}
