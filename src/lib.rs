//! Terminal I/O protocol and text-layout core for console UI toolkits.
//!
//! Invariant: every device write goes through [`write_lock`], so background refreshers and
//! the foreground never interleave inside one control sequence.
//!
//! # Public API Overview
//! - Classify, scan, split, and strip control sequences with the [`scanner`] helpers.
//! - Write to any destination through the [`ConsolePort`] contract; pick a backend with
//!   [`open_port`].
//! - Resolve the cursor position or window size in raw mode with [`query_cursor_position`].
//! - Wrap, measure, and paginate text against a [`ViewportRect`].

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Error type shared by every fallible call.
pub use crate::error::{ConsoleError, Result};

/// Environment-driven settings and debug logging.
pub use crate::config::EnvConfig;
pub use crate::logging::init_debug_log;

/// Control-sequence classification and scanning.
pub use crate::core::text::scanner::{self, FamilySet, ScanResult};
pub use crate::core::text::sequence::{classify, SequenceFamily, SequenceMatch};

/// Width, truncation, and wrapping helpers that ignore control sequences.
pub use crate::core::text::utils::{pad_to_width, truncate_to_width};
pub use crate::core::text::width::visible_width;
pub use crate::core::text::wrap::{wrap, wrap_words};

/// Geometry, key decoding, and device facts.
pub use crate::core::capabilities::{is_raw_mode, DeviceCapabilities};
pub use crate::core::cursor::{Coordinate, Size};
pub use crate::core::key::{Key, KeyPress, Modifiers};
pub use crate::core::output::{write_lock, TerminalCmd};

/// The console contract and its backends.
pub use crate::core::port::{effective_window_size, ConsolePort, DeviceState};
pub use crate::platform::{
    open_port, BackendKind, DiscardPort, FileSinkPort, LiveTerminal, MemoryPort,
    VirtualTerminal,
};

/// In-band cursor and size queries.
pub use crate::platform::cursor_query::{
    query_cursor_position, query_window_size, PendingInput, QueryChannel,
};

/// Viewport layout.
pub use crate::render::{
    check_console_size, filtered_position, is_overflowing, paginate, rows_available, NavDelta,
    PageState, SizeRequirement, SoftPageWriter, ViewportRect,
};

/// Background helpers.
pub use crate::runtime::{CyclicRefresher, InterruptHandle, LineReader, ResizeListener};

/// Selection widget state.
pub use crate::widgets::{Choice, ChoiceItem, SelectionList, SelectionState};
