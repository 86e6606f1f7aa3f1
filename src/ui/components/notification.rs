//! Toast notifications for save results and other transient feedback.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Maximum number of toasts kept at once.
const MAX_VISIBLE: usize = 3;

/// Width of a toast in columns.
const TOAST_WIDTH: u16 = 48;

/// The kind of notification, which determines its appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Info,
    Success,
    Error,
}

impl NotificationType {
    fn icon(self) -> &'static str {
        match self {
            NotificationType::Info => "ℹ",
            NotificationType::Success => "✓",
            NotificationType::Error => "✗",
        }
    }

    fn color(self) -> Color {
        match self {
            NotificationType::Info => Color::Blue,
            NotificationType::Success => Color::Green,
            NotificationType::Error => Color::Red,
        }
    }

    fn lifetime(self) -> Duration {
        match self {
            NotificationType::Error => Duration::from_secs(6),
            _ => Duration::from_secs(3),
        }
    }
}

/// A single notification message.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationType,
    created_at: Instant,
}

impl Notification {
    fn new(message: impl Into<String>, kind: NotificationType) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.kind.lifetime()
    }
}

/// Queue of live toasts, oldest first.
#[derive(Debug, Default)]
pub struct NotificationManager {
    notifications: VecDeque<Notification>,
}

impl NotificationManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
        while self.notifications.len() > MAX_VISIBLE {
            self.notifications.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Notification::new(message, NotificationType::Info));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notification::new(message, NotificationType::Success));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notification::new(message, NotificationType::Error));
    }

    /// Drop expired toasts. Called on each tick.
    pub fn tick(&mut self) {
        self.expire(Instant::now());
    }

    fn expire(&mut self, now: Instant) {
        self.notifications.retain(|n| !n.is_expired(now));
    }

    /// Live toasts, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Render toasts stacked in the top-right corner of `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = TOAST_WIDTH.min(area.width);
        let mut y = area.y + 1;

        for notification in self.notifications.iter().rev() {
            let inner_width = width.saturating_sub(4).max(1) as usize;
            let text_lines = notification.message.chars().count().div_ceil(inner_width).max(1);
            let height = text_lines as u16 + 2;
            if y + height > area.bottom() {
                break;
            }

            let rect = Rect::new(area.right().saturating_sub(width + 1), y, width, height);
            let color = notification.kind.color();
            let line = Line::from(vec![
                Span::styled(
                    format!("{} ", notification.kind.icon()),
                    Style::default().fg(color),
                ),
                Span::raw(notification.message.clone()),
            ]);

            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(line).wrap(Wrap { trim: true }).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color)),
                ),
                rect,
            );
            y += height;
        }
    }
}
