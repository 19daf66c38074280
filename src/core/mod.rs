//! Core types: sequences and text, keys, geometry, and the console port contract.

pub mod capabilities;
pub mod cursor;
pub mod key;
pub mod output;
pub mod port;
pub mod text;
