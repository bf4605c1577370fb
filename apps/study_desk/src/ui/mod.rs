//! Terminal front end: command loop and plain-text view.

pub mod terminal;
pub mod view;
