//! Background helpers: resize notifications, timed refresh, interruptible line input.

pub mod line_reader;
pub mod refresher;
pub mod resize_listener;

pub use line_reader::{InterruptHandle, LineReader};
pub use refresher::CyclicRefresher;
pub use resize_listener::ResizeListener;
