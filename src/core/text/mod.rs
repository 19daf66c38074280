//! Text helpers: control-sequence classification and scanning, display widths, wrapping
//! and truncation.
//!
//! Everything here is pure (string in, string out) so the layout and port layers can share
//! it without any I/O.

pub mod scanner;
pub mod sequence;
pub mod style;
pub mod utils;
pub mod width;
pub mod wrap;
