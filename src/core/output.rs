//! Typed control output and the process-wide write lock.
//!
//! Invariant: every device write holds [`write_lock`] for the whole emission, so output
//! from a background refresher never lands in the middle of a foreground sequence.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::core::cursor::{Coordinate, Size};

static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// Serializes writes across every port and thread.
pub fn write_lock() -> MutexGuard<'static, ()> {
    WRITE_LOCK.lock().expect("write lock poisoned")
}

pub const QUERY_CURSOR: &str = "\x1b[6n";
pub const QUERY_WINDOW_SIZE: &str = "\x1b[18t";
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
pub const BELL: &str = "\x07";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Absolute move; the coordinate is 0-based, the emitted sequence 1-based.
    MoveTo(Coordinate),
    HideCursor,
    ShowCursor,
    ClearScreen,
    /// `ESC[8;h;wt` window resize request.
    Resize(Size),
    QueryCursor,
    QueryWindowSize,
    /// Two-parameter bell tone followed by BEL.
    Tone { frequency_hz: u32, duration_ms: u32 },
    Bell,
}

impl fmt::Display for TerminalCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalCmd::MoveTo(position) => write!(
                f,
                "\x1b[{};{}H",
                u32::from(position.y) + 1,
                u32::from(position.x) + 1
            ),
            TerminalCmd::HideCursor => f.write_str("\x1b[?25l"),
            TerminalCmd::ShowCursor => f.write_str("\x1b[?25h"),
            TerminalCmd::ClearScreen => f.write_str(CLEAR_SCREEN),
            TerminalCmd::Resize(size) => write!(f, "\x1b[8;{};{}t", size.height, size.width),
            TerminalCmd::QueryCursor => f.write_str(QUERY_CURSOR),
            TerminalCmd::QueryWindowSize => f.write_str(QUERY_WINDOW_SIZE),
            TerminalCmd::Tone {
                frequency_hz,
                duration_ms,
            } => write!(f, "\x1b[10;{frequency_hz}]\x1b[11;{duration_ms}]\x07"),
            TerminalCmd::Bell => f.write_str(BELL),
        }
    }
}

impl TerminalCmd {
    pub fn cursor_visibility(visible: bool) -> Self {
        if visible {
            TerminalCmd::ShowCursor
        } else {
            TerminalCmd::HideCursor
        }
    }
}
