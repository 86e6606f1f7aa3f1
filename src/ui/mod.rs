//! User interface components and views.
//!
//! Views render application state into panes; components are the widgets
//! they are built from.

pub mod components;
pub mod theme;
pub mod views;
