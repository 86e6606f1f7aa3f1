//! Issue detail pane, also used as the edit form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use crate::api::types::{Issue, Journal};
use crate::edit::{EditSession, FieldKind, EDITABLE_FIELDS};
use crate::ui::theme::theme;

/// Everything the detail pane needs to draw itself.
pub struct DetailProps<'a> {
    pub issue: Option<&'a Issue>,
    /// Present while the issue is being edited.
    pub edit: Option<&'a EditSession>,
    pub scroll: u16,
    pub focused: bool,
}

/// Render the detail pane.
pub fn render(frame: &mut Frame, area: Rect, props: &DetailProps) {
    let t = theme();

    let Some(issue) = props.issue else {
        let block = Block::default()
            .title(" Details ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(t.pane_border(props.focused));
        frame.render_widget(
            Paragraph::new(Line::styled("No issue selected", Style::default().fg(t.dim)))
                .block(block),
            area,
        );
        return;
    };

    match props.edit {
        Some(session) => render_edit(frame, area, issue, session),
        None => {
            let block = Block::default()
                .title(format!(" #{} ", issue.id))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(t.pane_border(props.focused));
            let paragraph = Paragraph::new(issue_lines(issue))
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((props.scroll, 0));
            frame.render_widget(paragraph, area);
        }
    }
}

fn field_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), Style::default().fg(theme().dim)),
        Span::raw(value),
    ])
}

/// Read-only issue details with change history.
pub fn issue_lines(issue: &Issue) -> Vec<Line<'static>> {
    let t = theme();
    let mut lines = vec![
        Line::styled(
            issue.subject.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        field_line("Project", issue.project.name.clone()),
        field_line("Tracker", issue.tracker.name.clone()),
        field_line("Status", issue.status.name.clone()),
        field_line("Priority", issue.priority.name.clone()),
        field_line("Author", issue.author.name.clone()),
        field_line("Assignee", issue.assignee_name().to_string()),
        field_line("Progress", format!("{}%", issue.done_ratio)),
        field_line(
            "Start",
            issue.start_date.clone().unwrap_or_else(|| "-".to_string()),
        ),
        field_line(
            "Due",
            issue.due_date.clone().unwrap_or_else(|| "-".to_string()),
        ),
        field_line("Created", Issue::short_timestamp(&issue.created_on)),
        field_line("Updated", Issue::short_timestamp(&issue.updated_on)),
        Line::raw(""),
        Line::styled("Description", t.heading()),
    ];

    if issue.description.trim().is_empty() {
        lines.push(Line::styled("(none)", Style::default().fg(t.dim)));
    } else {
        lines.extend(issue.description.lines().map(|l| Line::raw(l.to_string())));
    }

    if !issue.journals.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::styled("History", t.heading()));
        for journal in &issue.journals {
            lines.extend(journal_lines(journal));
        }
    }
    lines
}

fn journal_lines(journal: &Journal) -> Vec<Line<'static>> {
    let t = theme();
    let mut lines = vec![
        Line::raw(""),
        Line::from(vec![
            Span::styled(
                journal.user.name.clone(),
                Style::default().fg(t.active_border),
            ),
            Span::styled(
                format!(" · {}", Issue::short_timestamp(&journal.created_on)),
                Style::default().fg(t.dim),
            ),
        ]),
    ];

    for detail in &journal.details {
        lines.push(Line::styled(
            format!(
                "  • {}: {} → {}",
                detail.name,
                detail.old_value.as_deref().unwrap_or("-"),
                detail.new_value.as_deref().unwrap_or("-")
            ),
            Style::default().fg(t.dim),
        ));
    }
    lines.extend(
        journal
            .notes
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| Line::raw(format!("  {}", l))),
    );
    lines
}

/// Pending changes followed by every editable field.
pub fn edit_lines(session: &EditSession) -> Vec<Line<'static>> {
    let t = theme();
    let mut lines = Vec::new();

    let summary = session.change_summary();
    if !summary.is_empty() {
        lines.push(Line::styled("Pending changes", t.heading()));
        for (label, old, new) in summary {
            lines.push(Line::styled(
                format!("  {}: {} → {}", label, one_line(old), one_line(new)),
                Style::default().fg(t.danger),
            ));
        }
        lines.push(Line::raw(""));
    }

    let active = session.active_field().id;
    for entry in EDITABLE_FIELDS.iter() {
        let dirty = if session.is_dirty(entry.id) { "*" } else { " " };
        let value = one_line(session.display_value(entry.id));
        let style = if entry.id == active {
            Style::default()
                .fg(t.header_fg)
                .bg(t.active_border)
                .add_modifier(Modifier::BOLD)
        } else if session.is_dirty(entry.id) {
            Style::default().fg(t.warning)
        } else {
            Style::default()
        };
        lines.push(Line::styled(
            format!("{}{:<12} {}", dirty, entry.label, value),
            style,
        ));
    }
    lines
}

fn one_line(value: &str) -> String {
    match value.split_once('\n') {
        Some((first, _)) => format!("{}…", first),
        None if value.is_empty() => "(empty)".to_string(),
        None => value.to_string(),
    }
}

fn render_edit(frame: &mut Frame, area: Rect, issue: &Issue, session: &EditSession) {
    let t = theme();
    let field = session.active_field();
    let editor_height = match field.kind {
        FieldKind::Multiline => 8,
        _ => 3,
    };

    let border = if session.has_unsaved_changes() {
        Style::default().fg(t.danger)
    } else {
        t.pane_border(true)
    };
    let title = if session.has_unsaved_changes() {
        format!(" Editing #{} [UNSAVED] ", issue.id)
    } else {
        format!(" Editing #{} ", issue.id)
    };
    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(
            " Tab/Enter: Next  Shift+Tab: Prev  ↑↓: Select  Ctrl+S: Save  Esc: Cancel ",
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(editor_height)])
        .split(inner);

    frame.render_widget(
        Paragraph::new(edit_lines(session)).wrap(Wrap { trim: false }),
        chunks[0],
    );

    let label = match field.kind {
        FieldKind::Select(_) => format!("{} (↑/↓ to choose)", field.label),
        FieldKind::Multiline => format!("{} (Ctrl+J: new line)", field.label),
        FieldKind::Number => format!("{} (0-100)", field.label),
        FieldKind::Date => format!("{} (YYYY-MM-DD)", field.label),
        FieldKind::Text => field.label.to_string(),
    };
    session
        .editor()
        .render_with_label(frame, chunks[1], &label, true);
}
