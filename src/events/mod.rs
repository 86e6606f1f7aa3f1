//! Event handling for the application.
//!
//! This module turns terminal input into application events and maps
//! browse-mode keys to actions.

mod handler;
mod keys;

use crossterm::event::KeyEvent;

pub use handler::EventHandler;
pub use keys::{browse_action, is_quit, BrowseAction};

/// Application events fed into `App::update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key press.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
    /// No input arrived within the tick rate.
    Tick,
}
