//! Widgets built on the layout engine.

pub mod selection;

pub use selection::{Choice, ChoiceItem, SelectionList, SelectionState};
