//! Uniform console contract shared by every backend.
//!
//! Interactive operations default to [`ConsoleError::Unsupported`], so output-only backends
//! implement just the write side. Interactive backends override the whole surface.

use std::fmt;

use crate::core::cursor::{Coordinate, Size};
use crate::core::key::KeyPress;
use crate::core::output::{TerminalCmd, BELL, CLEAR_SCREEN};
use crate::error::{ConsoleError, Result};

/// Per-port device state. `moved` is set by mutating calls and cleared when read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub is_dumb: bool,
    pub is_raw_mode: bool,
    moved: bool,
}

impl DeviceState {
    pub fn new(is_dumb: bool) -> Self {
        Self {
            is_dumb,
            ..Self::default()
        }
    }

    pub fn mark_moved(&mut self) {
        self.moved = true;
    }

    pub fn take_moved(&mut self) -> bool {
        std::mem::take(&mut self.moved)
    }
}

pub trait ConsolePort: Send {
    /// Short backend identifier, used in errors and logs.
    fn backend_name(&self) -> &'static str;

    fn state(&self) -> &DeviceState;

    fn state_mut(&mut self) -> &mut DeviceState;

    fn write(&mut self, text: &str) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_dumb(&self) -> bool {
        self.state().is_dumb
    }

    /// Whether anything moved the cursor or changed the screen since the last call.
    fn movement_detected(&mut self) -> bool {
        self.state_mut().take_moved()
    }

    fn write_error(&mut self, text: &str) -> Result<()> {
        self.write(text)
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        self.write(&line)
    }

    fn write_error_line(&mut self, text: &str) -> Result<()> {
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        self.write_error(&line)
    }

    fn write_formatted(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        match args.as_str() {
            Some(text) => self.write(text),
            None => self.write(&args.to_string()),
        }
    }

    fn cursor_position(&mut self) -> Result<Coordinate> {
        Err(self.unsupported("cursor_position"))
    }

    fn set_cursor_position(&mut self, position: Coordinate) -> Result<()> {
        let _ = position;
        Err(self.unsupported("set_cursor_position"))
    }

    fn set_cursor_left(&mut self, left: u16) -> Result<()> {
        let current = self.cursor_position()?;
        self.set_cursor_position(Coordinate::new(left, current.y))
    }

    fn set_cursor_top(&mut self, top: u16) -> Result<()> {
        let current = self.cursor_position()?;
        self.set_cursor_position(Coordinate::new(current.x, top))
    }

    fn window_size(&mut self) -> Result<Size> {
        Err(self.unsupported("window_size"))
    }

    fn buffer_size(&mut self) -> Result<Size> {
        Err(self.unsupported("buffer_size"))
    }

    fn set_window_size(&mut self, size: Size) -> Result<()> {
        let _ = size;
        Err(self.unsupported("set_window_size"))
    }

    fn set_buffer_size(&mut self, size: Size) -> Result<()> {
        let _ = size;
        Err(self.unsupported("set_buffer_size"))
    }

    fn set_window_width(&mut self, width: u16) -> Result<()> {
        let current = self.window_size()?;
        self.set_window_size(Size::new(width, current.height))
    }

    fn set_window_height(&mut self, height: u16) -> Result<()> {
        let current = self.window_size()?;
        self.set_window_size(Size::new(current.width, height))
    }

    fn cursor_visible(&self) -> Result<bool> {
        Err(self.unsupported("cursor_visible"))
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        let _ = visible;
        Err(self.unsupported("set_cursor_visible"))
    }

    fn key_available(&mut self) -> Result<bool> {
        Err(self.unsupported("key_available"))
    }

    /// Blocks for the next key press.
    fn read_key(&mut self) -> Result<KeyPress> {
        Err(self.unsupported("read_key"))
    }

    /// Native beep.
    fn beep(&mut self) -> Result<()> {
        Err(self.unsupported("beep"))
    }

    /// Tone of the given pitch and length; blocks for `duration_ms`.
    fn beep_tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<()> {
        let _ = (frequency_hz, duration_ms);
        Err(self.unsupported("beep_tone"))
    }

    /// Beep by emitting BEL.
    fn beep_sequence(&mut self) -> Result<()> {
        Err(self.unsupported("beep_sequence"))
    }

    fn clear(&mut self) -> Result<()> {
        Err(self.unsupported("clear"))
    }

    fn unsupported(&self, operation: &'static str) -> ConsoleError {
        ConsoleError::unsupported(operation, self.backend_name())
    }
}

/// Window size for layout purposes: dumb or output-only ports report [`Size::UNBOUNDED`].
pub fn effective_window_size(port: &mut dyn ConsolePort) -> Result<Size> {
    if port.is_dumb() {
        return Ok(Size::UNBOUNDED);
    }
    match port.window_size() {
        Err(err) if err.is_unsupported() => Ok(Size::UNBOUNDED),
        other => other,
    }
}

/// Shared emission helpers for interactive ports writing through their own `write`.
pub(crate) fn emit<P: ConsolePort + ?Sized>(port: &mut P, cmd: TerminalCmd) -> Result<()> {
    port.write(&cmd.to_string())
}

pub(crate) fn emit_clear<P: ConsolePort + ?Sized>(port: &mut P) -> Result<()> {
    port.write(CLEAR_SCREEN)
}

pub(crate) fn emit_bell<P: ConsolePort + ?Sized>(port: &mut P) -> Result<()> {
    port.write(BELL)
}
