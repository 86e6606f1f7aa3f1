//! Issue editing: the editable-field table and the edit session.

pub mod fields;
pub mod session;

pub use fields::{EditOptions, FieldKind, EDITABLE_FIELDS};
pub use session::{EditAction, EditSession};
