//! Interactive terminal on the process's stdin/stdout.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::EnvConfig;
use crate::core::capabilities::{self, DeviceCapabilities};
use crate::core::cursor::{Coordinate, Size};
use crate::core::key::KeyPress;
use crate::core::output::{write_lock, TerminalCmd};
use crate::core::port::{emit, emit_bell, emit_clear, ConsolePort, DeviceState};
use crate::error::{ConsoleError, Result};
use crate::platform::cursor_query::{
    query_cursor_position, query_window_size, PendingInput, QueryChannel,
};

#[cfg(unix)]
use libc::{self, c_int};

#[cfg(unix)]
fn wait_writable(fd: c_int) -> std::io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result == 0 {
            continue;
        }
        if (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }
        return Err(std::io::Error::other(format!(
            "poll(POLLOUT) returned revents=0x{:x}",
            fds.revents
        )));
    }
}

/// Writes all of `bytes`, retrying on `EINTR` and waiting out `EAGAIN`.
#[cfg(unix)]
fn write_all_fd_with<FWrite, FWait>(
    fd: c_int,
    bytes: &[u8],
    mut write_once: FWrite,
    mut wait: FWait,
) -> std::io::Result<()>
where
    FWrite: FnMut(c_int, &[u8]) -> std::io::Result<usize>,
    FWait: FnMut(c_int) -> std::io::Result<()>,
{
    let mut written = 0;
    while written < bytes.len() {
        match write_once(fd, &bytes[written..]) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "write returned 0",
                ));
            }
            Ok(count) => written += count.min(bytes.len() - written),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => wait(fd)?,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn write_fd(fd: c_int, data: &str) -> std::io::Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    write_all_fd_with(
        fd,
        data.as_bytes(),
        |fd, buf| {
            let result = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
            if result < 0 {
                Err(std::io::Error::last_os_error())
            } else {
                Ok(result as usize)
            }
        },
        wait_writable,
    )
}

#[cfg(unix)]
fn read_winsize(fd: c_int) -> Option<Size> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some(Size::new(size.ws_col, size.ws_row))
    } else {
        None
    }
}

/// Current size of the terminal on stdout, when stdout is one.
#[cfg(unix)]
pub fn stdout_window_size() -> Option<Size> {
    read_winsize(libc::STDOUT_FILENO)
}

#[cfg(not(unix))]
pub fn stdout_window_size() -> Option<Size> {
    None
}

#[cfg(unix)]
fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    result > 0 && (fds.revents & (libc::POLLIN | libc::POLLHUP)) != 0
}

#[cfg(unix)]
fn get_termios(fd: c_int) -> std::io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: c_int, termios: &libc::termios) -> std::io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(unix)]
const READ_CHUNK: usize = 4096;

/// Short poll while an escape tail waits for its flush deadline.
#[cfg(unix)]
const PARTIAL_POLL_MS: i32 = 50;

#[cfg(unix)]
pub struct LiveTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    stderr_fd: c_int,
    state: DeviceState,
    original_termios: Option<libc::termios>,
    pending: PendingInput,
    cursor_visible: bool,
    write_log_path: Option<PathBuf>,
    write_log_failed: bool,
    resize_delay: Duration,
}

#[cfg(unix)]
impl LiveTerminal {
    pub fn new(config: &EnvConfig) -> Self {
        let capabilities = DeviceCapabilities::cached(config);
        Self::with_fds(
            libc::STDIN_FILENO,
            libc::STDOUT_FILENO,
            libc::STDERR_FILENO,
            capabilities,
            config,
        )
    }

    /// Terminal over caller-owned descriptors. They are not closed on drop.
    pub(crate) fn with_fds(
        stdin_fd: c_int,
        stdout_fd: c_int,
        stderr_fd: c_int,
        capabilities: DeviceCapabilities,
        config: &EnvConfig,
    ) -> Self {
        Self {
            stdin_fd,
            stdout_fd,
            stderr_fd,
            state: DeviceState::new(capabilities.is_dumb),
            original_termios: None,
            pending: PendingInput::new(),
            cursor_visible: true,
            write_log_path: config.write_log.clone(),
            write_log_failed: false,
            resize_delay: config.resize_delay,
        }
    }

    /// Puts stdin in raw mode. No-op when already raw or dumb.
    pub fn enter_raw_mode(&mut self) -> Result<()> {
        if self.state.is_dumb || self.state.is_raw_mode {
            return Ok(());
        }
        let original = get_termios(self.stdin_fd)?;
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)?;
        self.original_termios = Some(original);
        self.state.is_raw_mode = true;
        capabilities::set_raw_mode(true);
        tracing::debug!(fd = self.stdin_fd, "raw mode entered");
        Ok(())
    }

    pub fn leave_raw_mode(&mut self) -> Result<()> {
        if !self.state.is_raw_mode {
            return Ok(());
        }
        if let Some(original) = self.original_termios.take() {
            set_termios(self.stdin_fd, &original)?;
        }
        self.state.is_raw_mode = false;
        capabilities::set_raw_mode(false);
        tracing::debug!(fd = self.stdin_fd, "raw mode left");
        Ok(())
    }

    /// Runs a query round trip, holding raw mode for its duration so the reply is
    /// neither echoed nor line-buffered.
    fn with_query<T>(
        &mut self,
        query: fn(&mut Self, &mut PendingInput) -> Result<T>,
    ) -> Result<T> {
        let was_raw = self.state.is_raw_mode;
        self.enter_raw_mode()?;
        let mut pending = std::mem::take(&mut self.pending);
        let result = query(self, &mut pending);
        self.pending = pending;
        if !was_raw {
            self.leave_raw_mode()?;
        }
        result
    }

    fn write_to(&mut self, fd: c_int, data: &str) -> Result<()> {
        if self.state.is_dumb {
            return Ok(());
        }
        {
            let _guard = write_lock();
            write_fd(fd, data)?;
        }
        self.append_write_log(data);
        self.state.mark_moved();
        Ok(())
    }

    fn append_write_log(&mut self, data: &str) {
        if self.write_log_failed {
            return;
        }
        if let Some(path) = self.write_log_path.as_ref() {
            let result = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(data.as_bytes()));
            if let Err(err) = result {
                tracing::warn!(path = %path.display(), error = %err, "write log disabled");
                self.write_log_failed = true;
            }
        }
    }

    fn read_chunk(&mut self, timeout_ms: i32) -> Result<Option<Vec<u8>>> {
        if !poll_readable(self.stdin_fd, timeout_ms) {
            return Ok(None);
        }
        let mut buffer = [0u8; READ_CHUNK];
        let read_len =
            unsafe { libc::read(self.stdin_fd, buffer.as_mut_ptr() as *mut _, buffer.len()) };
        if read_len < 0 {
            let err = std::io::Error::last_os_error();
            if matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock
            ) {
                return Ok(None);
            }
            return Err(err.into());
        }
        if read_len == 0 {
            return Err(ConsoleError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "terminal input closed",
            )));
        }
        Ok(Some(buffer[..read_len as usize].to_vec()))
    }
}

#[cfg(unix)]
impl Drop for LiveTerminal {
    fn drop(&mut self) {
        if !self.cursor_visible {
            let _ = self.set_cursor_visible(true);
        }
        let _ = self.leave_raw_mode();
    }
}

#[cfg(unix)]
impl QueryChannel for LiveTerminal {
    fn send(&mut self, query: &str) -> Result<()> {
        self.write(query)
    }

    fn recv_chunk(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(chunk) = self.read_chunk(-1)? {
                return Ok(chunk);
            }
        }
    }
}

#[cfg(unix)]
impl ConsolePort for LiveTerminal {
    fn backend_name(&self) -> &'static str {
        "live"
    }

    fn state(&self) -> &DeviceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.write_to(self.stdout_fd, text)
    }

    fn write_error(&mut self, text: &str) -> Result<()> {
        self.write_to(self.stderr_fd, text)
    }

    fn cursor_position(&mut self) -> Result<Coordinate> {
        if self.state.is_dumb {
            return Ok(Coordinate::ORIGIN);
        }
        self.with_query(|term, pending| query_cursor_position(term, pending))
    }

    fn set_cursor_position(&mut self, position: Coordinate) -> Result<()> {
        emit(self, TerminalCmd::MoveTo(position))
    }

    fn window_size(&mut self) -> Result<Size> {
        if self.state.is_dumb {
            return Ok(Size::UNBOUNDED);
        }
        match read_winsize(self.stdout_fd) {
            Some(size) => Ok(size),
            None => self.with_query(|term, pending| query_window_size(term, pending)),
        }
    }

    fn buffer_size(&mut self) -> Result<Size> {
        self.window_size()
    }

    fn set_window_size(&mut self, size: Size) -> Result<()> {
        if size.is_empty() {
            return Err(ConsoleError::InvalidDimensions {
                width: size.width,
                height: size.height,
            });
        }
        if self.state.is_dumb {
            return Ok(());
        }
        emit(self, TerminalCmd::Resize(size))?;
        tracing::debug!(%size, delay_ms = self.resize_delay.as_millis() as u64, "resize requested");
        // Size reports are stale until the emulator has applied the request.
        std::thread::sleep(self.resize_delay);
        Ok(())
    }

    fn set_buffer_size(&mut self, size: Size) -> Result<()> {
        self.set_window_size(size)
    }

    fn cursor_visible(&self) -> Result<bool> {
        Ok(self.cursor_visible)
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        emit(self, TerminalCmd::cursor_visibility(visible))?;
        self.cursor_visible = visible;
        Ok(())
    }

    fn key_available(&mut self) -> Result<bool> {
        Ok(!self.pending.is_empty() || poll_readable(self.stdin_fd, 0))
    }

    fn read_key(&mut self) -> Result<KeyPress> {
        loop {
            if let Some(key) = self.pending.pop_key() {
                return Ok(key);
            }
            let now = Instant::now();
            let timeout_ms = if self.pending.has_partial() {
                self.pending.next_timeout_ms(now, PARTIAL_POLL_MS)
            } else {
                -1
            };
            match self.read_chunk(timeout_ms) {
                Ok(Some(chunk)) => self.pending.feed(&chunk),
                Ok(None) => self.pending.flush_due(Instant::now()),
                Err(err) => {
                    self.pending.flush_all();
                    if self.pending.is_empty() {
                        return Err(err);
                    }
                }
            }
        }
    }

    fn beep(&mut self) -> Result<()> {
        emit_bell(self)
    }

    fn beep_tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<()> {
        if self.state.is_dumb {
            return Ok(());
        }
        emit(
            self,
            TerminalCmd::Tone {
                frequency_hz,
                duration_ms,
            },
        )?;
        std::thread::sleep(Duration::from_millis(u64::from(duration_ms)));
        Ok(())
    }

    fn beep_sequence(&mut self) -> Result<()> {
        emit_bell(self)
    }

    fn clear(&mut self) -> Result<()> {
        emit_clear(self)
    }
}

/// Without termios the live terminal is output-only and reports itself dumb.
#[cfg(not(unix))]
pub struct LiveTerminal {
    state: DeviceState,
    write_log_path: Option<PathBuf>,
    write_log_failed: bool,
}

#[cfg(not(unix))]
impl LiveTerminal {
    pub fn new(config: &EnvConfig) -> Self {
        tracing::debug!(
            is_dumb = DeviceCapabilities::cached(config).is_dumb,
            "live terminal is output-only on this platform"
        );
        Self {
            state: DeviceState::new(true),
            write_log_path: config.write_log.clone(),
            write_log_failed: false,
        }
    }
}

#[cfg(not(unix))]
impl ConsolePort for LiveTerminal {
    fn backend_name(&self) -> &'static str {
        "live"
    }

    fn state(&self) -> &DeviceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    fn write(&mut self, text: &str) -> Result<()> {
        {
            let _guard = write_lock();
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
        if !self.write_log_failed {
            if let Some(path) = self.write_log_path.as_ref() {
                let result = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .and_then(|mut file| file.write_all(text.as_bytes()));
                self.write_log_failed = result.is_err();
            }
        }
        self.state.mark_moved();
        Ok(())
    }

    fn cursor_position(&mut self) -> Result<Coordinate> {
        Ok(Coordinate::ORIGIN)
    }

    fn window_size(&mut self) -> Result<Size> {
        Ok(Size::UNBOUNDED)
    }

    fn buffer_size(&mut self) -> Result<Size> {
        Ok(Size::UNBOUNDED)
    }
}
