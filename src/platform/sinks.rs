//! Output-only backends: discard, in-memory capture, and append-only file.
//!
//! These are always dumb. Interactive calls fall through to the trait defaults and return
//! `Unsupported`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::output::write_lock;
use crate::core::port::{ConsolePort, DeviceState};
use crate::core::text::scanner::{incomplete_tail, strip};
use crate::error::Result;

/// Swallows all output.
#[derive(Debug)]
pub struct DiscardPort {
    state: DeviceState,
}

impl DiscardPort {
    pub fn new() -> Self {
        Self {
            state: DeviceState::new(true),
        }
    }
}

impl Default for DiscardPort {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsolePort for DiscardPort {
    fn backend_name(&self) -> &'static str {
        "discard"
    }

    fn state(&self) -> &DeviceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    fn write(&mut self, _text: &str) -> Result<()> {
        self.state.mark_moved();
        Ok(())
    }
}

/// Captures output in memory, sequences included.
#[derive(Debug)]
pub struct MemoryPort {
    state: DeviceState,
    buffer: String,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self {
            state: DeviceState::new(true),
            buffer: String::new(),
        }
    }

    pub fn contents(&self) -> &str {
        &self.buffer
    }

    /// Returns the captured output and empties the buffer.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

impl Default for MemoryPort {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsolePort for MemoryPort {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn state(&self) -> &DeviceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    fn write(&mut self, text: &str) -> Result<()> {
        let _guard = write_lock();
        self.buffer.push_str(text);
        self.state.mark_moved();
        Ok(())
    }
}

/// Appends output to a file, optionally with every control sequence removed.
///
/// When stripping, a sequence cut off at the end of one write is held back until a later
/// write completes it. `flush` and drop write whatever is still held as-is.
#[derive(Debug)]
pub struct FileSinkPort {
    state: DeviceState,
    path: PathBuf,
    file: File,
    strip_sequences: bool,
    held: String,
}

impl FileSinkPort {
    /// Opens `path` for appending, creating it when missing.
    pub fn open(path: impl AsRef<Path>, strip_sequences: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::debug!(path = %path.display(), strip_sequences, "file sink opened");
        Ok(Self {
            state: DeviceState::new(true),
            path,
            file,
            strip_sequences,
            held: String::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn strips_sequences(&self) -> bool {
        self.strip_sequences
    }
}

impl ConsolePort for FileSinkPort {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    fn state(&self) -> &DeviceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    fn write(&mut self, text: &str) -> Result<()> {
        let _guard = write_lock();
        if self.strip_sequences {
            let mut pending = std::mem::take(&mut self.held);
            pending.push_str(text);
            let cut = incomplete_tail(&pending).unwrap_or(pending.len());
            self.file.write_all(strip(&pending[..cut]).as_bytes())?;
            self.held = pending.split_off(cut);
        } else {
            self.file.write_all(text.as_bytes())?;
        }
        self.state.mark_moved();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let _guard = write_lock();
        if !self.held.is_empty() {
            self.file.write_all(self.held.as_bytes())?;
            self.held.clear();
        }
        self.file.flush()?;
        Ok(())
    }
}

impl Drop for FileSinkPort {
    fn drop(&mut self) {
        if !self.held.is_empty() {
            if let Err(err) = self.file.write_all(self.held.as_bytes()) {
                tracing::debug!(%err, path = %self.path.display(), "held sink output lost");
            }
        }
    }
}
