//! Console backends and the in-band query protocol.

pub mod cursor_query;
pub mod live_terminal;
pub mod sinks;
pub mod stdin_buffer;
pub mod virtual_terminal;

use std::path::PathBuf;

use crate::config::EnvConfig;
use crate::core::port::ConsolePort;
use crate::error::Result;

pub use cursor_query::{query_cursor_position, query_window_size, PendingInput, QueryChannel};
pub use live_terminal::LiveTerminal;
pub use sinks::{DiscardPort, FileSinkPort, MemoryPort};
pub use virtual_terminal::VirtualTerminal;

/// Which backend the application writes to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Live,
    Discard,
    Memory,
    File {
        path: PathBuf,
        strip_sequences: bool,
    },
}

pub fn open_port(kind: BackendKind, config: &EnvConfig) -> Result<Box<dyn ConsolePort>> {
    let port: Box<dyn ConsolePort> = match kind {
        BackendKind::Live => Box::new(LiveTerminal::new(config)),
        BackendKind::Discard => Box::new(DiscardPort::new()),
        BackendKind::Memory => Box::new(MemoryPort::new()),
        BackendKind::File {
            path,
            strip_sequences,
        } => Box::new(FileSinkPort::open(path, strip_sequences)?),
    };
    tracing::debug!(
        backend = port.backend_name(),
        is_dumb = port.is_dumb(),
        "console port opened"
    );
    Ok(port)
}
