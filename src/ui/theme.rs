//! Theme and styling configuration.

use ratatui::style::{Color, Modifier, Style};

/// Color palette for the application.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub header_fg: Color,
    pub header_bg: Color,
    pub active_border: Color,
    pub inactive_border: Color,
    /// Accent of the user picker.
    pub users: Color,
    /// Accent of the project picker.
    pub projects: Color,
    /// Unsaved changes and errors.
    pub danger: Color,
    pub warning: Color,
    pub success: Color,
    pub dim: Color,
}

const DARK: Theme = Theme {
    header_fg: Color::Rgb(0xFF, 0xFF, 0xFF),
    header_bg: Color::Rgb(0x3E, 0x44, 0x51),
    active_border: Color::Rgb(0x61, 0xAF, 0xEF),
    inactive_border: Color::Rgb(0x5C, 0x63, 0x70),
    users: Color::Rgb(0x61, 0xAF, 0xEF),
    projects: Color::Rgb(0x98, 0xC3, 0x79),
    danger: Color::Rgb(0xE0, 0x6C, 0x75),
    warning: Color::Rgb(0xE5, 0xC0, 0x7B),
    success: Color::Rgb(0x98, 0xC3, 0x79),
    dim: Color::Rgb(0x66, 0x66, 0x66),
};

/// The active theme.
pub fn theme() -> &'static Theme {
    &DARK
}

impl Theme {
    /// Border style for a pane.
    pub fn pane_border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.active_border)
        } else {
            Style::default().fg(self.inactive_border)
        }
    }

    /// Style of section headings.
    pub fn heading(&self) -> Style {
        Style::default()
            .fg(self.warning)
            .add_modifier(Modifier::BOLD)
    }
}
