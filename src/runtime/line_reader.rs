//! Line input with cooperative interruption.
//!
//! [`InterruptHandle`] can be cloned to another thread. An interrupt makes the pending
//! [`LineReader::read_line`] return [`ConsoleError::Interrupted`] at its next poll; the
//! partial line is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::key::Key;
use crate::core::port::ConsolePort;
use crate::error::{ConsoleError, Result};

const DEFAULT_POLL: Duration = Duration::from_millis(10);
const ERASE_ONE: &str = "\x08 \x08";

#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct LineReader {
    interrupt: InterruptHandle,
    poll_interval: Duration,
    echo: bool,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    pub fn new() -> Self {
        Self {
            interrupt: InterruptHandle::default(),
            poll_interval: DEFAULT_POLL,
            echo: true,
        }
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Reads keys until Enter. Ctrl+C counts as an interrupt.
    pub fn read_line(&mut self, port: &mut dyn ConsolePort) -> Result<String> {
        let mut line = String::new();
        loop {
            if self.interrupt.take() {
                tracing::debug!(discarded = line.len(), "line read interrupted");
                return Err(ConsoleError::Interrupted);
            }
            if !port.key_available()? {
                std::thread::sleep(self.poll_interval);
                continue;
            }

            let press = port.read_key()?;
            if press.is_ctrl('c') {
                self.interrupt.interrupt();
                continue;
            }
            match press.key {
                Key::Enter => {
                    if self.echo {
                        port.write_line("")?;
                    }
                    return Ok(line);
                }
                Key::Backspace => {
                    if line.pop().is_some() && self.echo {
                        port.write(ERASE_ONE)?;
                    }
                }
                _ => {
                    if let Some(ch) = press.printable() {
                        line.push(ch);
                        if self.echo {
                            let mut buf = [0u8; 4];
                            port.write(ch.encode_utf8(&mut buf))?;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::LineReader;
    use crate::core::cursor::Size;
    use crate::error::ConsoleError;
    use crate::platform::sinks::MemoryPort;
    use crate::platform::virtual_terminal::VirtualTerminal;

    #[test]
    fn reads_until_enter_with_editing() {
        let mut term = VirtualTerminal::new(Size::new(80, 24));
        term.push_input("ab\x7fc\x1b[D\r");
        let mut reader = LineReader::new();
        assert_eq!(reader.read_line(&mut term).expect("line"), "ac");
        assert_eq!(term.transcript(), "ab\x08 \x08c\n");
    }

    #[test]
    fn interrupt_from_another_thread_unwinds_the_read() {
        let mut term = VirtualTerminal::new(Size::new(80, 24));
        let mut reader = LineReader::new().with_poll_interval(Duration::from_millis(1));
        let handle = reader.interrupt_handle();
        let interrupter = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            handle.interrupt();
        });

        let err = reader.read_line(&mut term).unwrap_err();
        interrupter.join().expect("interrupter");
        assert!(matches!(err, ConsoleError::Interrupted));
        assert!(!reader.interrupt_handle().is_interrupted());
    }

    #[test]
    fn ctrl_c_interrupts() {
        let mut term = VirtualTerminal::new(Size::new(80, 24));
        term.push_input("x\x03");
        let mut reader = LineReader::new().with_echo(false);
        assert!(matches!(
            reader.read_line(&mut term),
            Err(ConsoleError::Interrupted)
        ));
        assert_eq!(term.transcript(), "");
    }

    #[test]
    fn output_only_ports_are_rejected() {
        let mut port = MemoryPort::new();
        let err = LineReader::new().read_line(&mut port).unwrap_err();
        assert!(err.is_unsupported());
    }
}
