//! Key bindings for browse mode.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Actions available while browsing the issue list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseAction {
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    SwitchPane,
    StartTextFilter,
    ClearFilters,
    ToggleScope,
    OpenUserPicker,
    OpenProjectPicker,
    Edit,
    Refresh,
    OpenInBrowser,
    ToggleHelp,
    Quit,
}

/// Whether a key is the global quit chord.
///
/// `q` is not included: it is a normal character in text inputs.
pub fn is_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Map a key to a browse action.
pub fn browse_action(key: &KeyEvent) -> Option<BrowseAction> {
    if is_quit(key) {
        return Some(BrowseAction::Quit);
    }

    let action = match key.code {
        KeyCode::Char('k') | KeyCode::Up => BrowseAction::Up,
        KeyCode::Char('j') | KeyCode::Down => BrowseAction::Down,
        KeyCode::PageUp => BrowseAction::PageUp,
        KeyCode::PageDown => BrowseAction::PageDown,
        KeyCode::Home | KeyCode::Char('g') => BrowseAction::Top,
        KeyCode::End | KeyCode::Char('G') => BrowseAction::Bottom,
        KeyCode::Tab => BrowseAction::SwitchPane,
        KeyCode::Char('f') | KeyCode::Char('/') => BrowseAction::StartTextFilter,
        KeyCode::Char('c') => BrowseAction::ClearFilters,
        KeyCode::Char('m') => BrowseAction::ToggleScope,
        KeyCode::Char('u') => BrowseAction::OpenUserPicker,
        KeyCode::Char('p') => BrowseAction::OpenProjectPicker,
        KeyCode::Char('e') | KeyCode::Enter => BrowseAction::Edit,
        KeyCode::Char('r') => BrowseAction::Refresh,
        KeyCode::Char('o') => BrowseAction::OpenInBrowser,
        KeyCode::Char('?') => BrowseAction::ToggleHelp,
        KeyCode::Char('q') => BrowseAction::Quit,
        _ => return None,
    };
    Some(action)
}
