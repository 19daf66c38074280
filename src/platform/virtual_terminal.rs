//! Headless interactive terminal.
//!
//! Interprets the control output it is sent (moves, clears, resizes, visibility) against an
//! in-memory cursor and answers `ESC[6n` / `ESC[18t` by queueing a reply on its own input,
//! the way a real emulator does. Input is scripted as a list of chunks; an exhausted script
//! reads as end of file instead of blocking.

use std::collections::VecDeque;

use unicode_segmentation::UnicodeSegmentation;

use crate::core::cursor::{Coordinate, Size};
use crate::core::key::KeyPress;
use crate::core::output::{write_lock, TerminalCmd, QUERY_CURSOR, QUERY_WINDOW_SIZE};
use crate::core::port::{emit, emit_bell, emit_clear, ConsolePort, DeviceState};
use crate::core::text::scanner::{sequences, FamilySet};
use crate::core::text::sequence::SequenceMatch;
use crate::core::text::width::grapheme_width;
use crate::error::{ConsoleError, Result};
use crate::platform::cursor_query::{query_cursor_position, PendingInput, QueryChannel};

#[derive(Debug)]
pub struct VirtualTerminal {
    state: DeviceState,
    cursor: Coordinate,
    size: Size,
    cursor_visible: bool,
    transcript: String,
    input: VecDeque<Vec<u8>>,
    pending: PendingInput,
    answer_queries: bool,
    queries_seen: usize,
}

impl VirtualTerminal {
    pub fn new(size: Size) -> Self {
        Self {
            state: DeviceState::new(false),
            cursor: Coordinate::ORIGIN,
            size,
            cursor_visible: true,
            transcript: String::new(),
            input: VecDeque::new(),
            pending: PendingInput::new(),
            answer_queries: true,
            queries_seen: 0,
        }
    }

    /// A terminal flagged dumb: writes are dropped and reads return sentinels.
    pub fn dumb() -> Self {
        let mut terminal = Self::new(Size::UNBOUNDED);
        terminal.state.is_dumb = true;
        terminal
    }

    /// Whether position and size queries get answered. A silent terminal blocks a query
    /// until scripted input runs out.
    pub fn with_query_replies(mut self, answer: bool) -> Self {
        self.answer_queries = answer;
        self
    }

    pub fn set_raw_mode(&mut self, raw: bool) {
        self.state.is_raw_mode = raw;
    }

    /// Appends a chunk of input, delivered by one read.
    pub fn push_input(&mut self, chunk: &str) {
        self.input.push_back(chunk.as_bytes().to_vec());
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) {
        self.input.push_back(chunk.to_vec());
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn take_transcript(&mut self) -> String {
        std::mem::take(&mut self.transcript)
    }

    /// Number of position or size queries received.
    pub fn queries_seen(&self) -> usize {
        self.queries_seen
    }

    /// Keys queued by an earlier query and not read yet.
    pub fn pending_keys(&self) -> usize {
        self.pending.len()
    }

    fn interpret(&mut self, text: &str) {
        let mut last = 0;
        for found in sequences(text, FamilySet::ALL) {
            self.advance_text(&text[last..found.start]);
            self.apply_sequence(&found);
            last = found.end();
        }
        self.advance_text(&text[last..]);
    }

    fn advance_text(&mut self, text: &str) {
        let width = self.size.width.max(1);
        let bottom = self.size.height.saturating_sub(1);
        for grapheme in text.graphemes(true) {
            match grapheme {
                "\n" | "\r\n" => {
                    self.cursor.x = 0;
                    self.cursor.y = self.cursor.y.saturating_add(1).min(bottom);
                }
                "\r" => self.cursor.x = 0,
                _ => {
                    let cells = u16::try_from(grapheme_width(grapheme)).unwrap_or(u16::MAX);
                    let next = self.cursor.x.saturating_add(cells);
                    if next >= width {
                        self.cursor.x = next - width;
                        self.cursor.y = self.cursor.y.saturating_add(1).min(bottom);
                    } else {
                        self.cursor.x = next;
                    }
                }
            }
        }
    }

    fn apply_sequence(&mut self, found: &SequenceMatch<'_>) {
        match found.text {
            QUERY_CURSOR => {
                self.queries_seen += 1;
                if self.answer_queries {
                    let reply = format!(
                        "\x1b[{};{}R",
                        u32::from(self.cursor.y) + 1,
                        u32::from(self.cursor.x) + 1
                    );
                    self.input.push_back(reply.into_bytes());
                }
            }
            QUERY_WINDOW_SIZE => {
                self.queries_seen += 1;
                if self.answer_queries {
                    let reply = format!("\x1b[8;{};{}t", self.size.height, self.size.width);
                    self.input.push_back(reply.into_bytes());
                }
            }
            "\x1b[?25l" => self.cursor_visible = false,
            "\x1b[?25h" => self.cursor_visible = true,
            "\x1b[H" => self.cursor = Coordinate::ORIGIN,
            other => {
                if let Some(params) = csi_params(other, 'H') {
                    if let [row, col] = params.as_slice() {
                        self.cursor = Coordinate::from_report(*row, *col);
                    }
                } else if let Some(params) = csi_params(other, 't') {
                    if let [8, height, width] = params.as_slice() {
                        self.size = Size::new(*width, *height);
                    }
                }
            }
        }
    }

    fn next_chunk(&mut self) -> Result<Vec<u8>> {
        self.input.pop_front().ok_or_else(|| {
            ConsoleError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "virtual terminal input exhausted",
            ))
        })
    }
}

fn csi_params(text: &str, final_char: char) -> Option<Vec<u16>> {
    let body = text.strip_prefix("\x1b[")?.strip_suffix(final_char)?;
    body.split(';').map(|field| field.parse().ok()).collect()
}

impl QueryChannel for VirtualTerminal {
    fn send(&mut self, query: &str) -> Result<()> {
        self.write(query)
    }

    fn recv_chunk(&mut self) -> Result<Vec<u8>> {
        self.next_chunk()
    }
}

impl ConsolePort for VirtualTerminal {
    fn backend_name(&self) -> &'static str {
        "virtual"
    }

    fn state(&self) -> &DeviceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    fn write(&mut self, text: &str) -> Result<()> {
        if self.state.is_dumb {
            return Ok(());
        }
        {
            let _guard = write_lock();
            self.transcript.push_str(text);
        }
        self.interpret(text);
        self.state.mark_moved();
        Ok(())
    }

    fn cursor_position(&mut self) -> Result<Coordinate> {
        if self.state.is_dumb {
            return Ok(Coordinate::ORIGIN);
        }
        if !self.state.is_raw_mode {
            return Ok(self.cursor);
        }
        let mut pending = std::mem::take(&mut self.pending);
        let result = query_cursor_position(self, &mut pending);
        self.pending = pending;
        result
    }

    fn set_cursor_position(&mut self, position: Coordinate) -> Result<()> {
        if self.state.is_dumb {
            return Ok(());
        }
        emit(self, TerminalCmd::MoveTo(position))
    }

    fn window_size(&mut self) -> Result<Size> {
        if self.state.is_dumb {
            return Ok(Size::UNBOUNDED);
        }
        Ok(self.size)
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
        emit(self, TerminalCmd::Resize(size))
    }

    fn set_buffer_size(&mut self, size: Size) -> Result<()> {
        self.set_window_size(size)
    }

    fn cursor_visible(&self) -> Result<bool> {
        Ok(self.cursor_visible)
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        emit(self, TerminalCmd::cursor_visibility(visible))
    }

    fn key_available(&mut self) -> Result<bool> {
        Ok(!self.pending.is_empty() || self.pending.has_partial() || !self.input.is_empty())
    }

    fn read_key(&mut self) -> Result<KeyPress> {
        loop {
            if let Some(key) = self.pending.pop_key() {
                return Ok(key);
            }
            match self.next_chunk() {
                Ok(chunk) => self.pending.feed(&chunk),
                Err(err) if self.pending.has_partial() => {
                    self.pending.flush_all();
                    if self.pending.is_empty() {
                        return Err(err);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn beep(&mut self) -> Result<()> {
        emit_bell(self)
    }

    fn beep_tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<()> {
        emit(
            self,
            TerminalCmd::Tone {
                frequency_hz,
                duration_ms,
            },
        )
    }

    fn beep_sequence(&mut self) -> Result<()> {
        emit_bell(self)
    }

    fn clear(&mut self) -> Result<()> {
        emit_clear(self)
    }
}
