//! Reusable UI components.

mod input;
mod loading;
mod multiselect;
mod notification;

pub use input::TextInput;
pub use loading::LoadingIndicator;
pub use multiselect::{centered_rect, MultiSelect, MultiSelectAction, SelectItem};
pub use notification::NotificationManager;
