//! Cursor-position and window-size queries answered in-band by the terminal.
//!
//! The query is written to the output and the reply arrives on the same stream as
//! keystrokes. Input read while waiting is split into units; the first unit that is a
//! well-formed reply ends the wait and every other unit is kept, in arrival order, for
//! later key reads.
//!
//! There is no timeout: a terminal that never replies blocks the caller. Queries must not
//! be issued concurrently; the single-owner `&mut` channel enforces that per port.

use std::collections::VecDeque;
use std::time::Instant;

use crate::core::cursor::{Coordinate, Size};
use crate::core::key::KeyPress;
use crate::core::output::{QUERY_CURSOR, QUERY_WINDOW_SIZE};
use crate::core::text::sequence::{extract_at, SequenceFamily};
use crate::error::Result;
use crate::platform::stdin_buffer::StdinBuffer;

/// Flush window for incomplete escape tails between input chunks.
const INPUT_FLUSH_MS: u64 = 10;

/// Duplex channel a query runs over: output for the request, input for the reply.
pub trait QueryChannel {
    fn send(&mut self, query: &str) -> Result<()>;

    /// Blocks until input is available and returns the bytes read.
    fn recv_chunk(&mut self) -> Result<Vec<u8>>;
}

/// Key input observed but not yet delivered.
#[derive(Debug)]
pub struct PendingInput {
    splitter: StdinBuffer,
    units: VecDeque<String>,
}

impl Default for PendingInput {
    fn default() -> Self {
        Self {
            splitter: StdinBuffer::new(INPUT_FLUSH_MS),
            units: VecDeque::new(),
        }
    }
}

impl PendingInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits a raw chunk and appends its complete units.
    pub fn feed(&mut self, chunk: &[u8]) {
        let events = self.splitter.process(chunk);
        self.units
            .extend(events.into_iter().map(|event| event.into_wire()));
    }

    /// Moves a timed-out incomplete tail (a lone ESC, usually) into the queue.
    pub fn flush_due(&mut self, now: Instant) {
        let events = self.splitter.flush_due(now);
        self.units
            .extend(events.into_iter().map(|event| event.into_wire()));
    }

    /// Queues a tail that is still incomplete regardless of its deadline.
    pub fn flush_all(&mut self) {
        let events = self.splitter.flush_events();
        self.units
            .extend(events.into_iter().map(|event| event.into_wire()));
    }

    /// Poll timeout for the next read, shortened while a tail awaits its deadline.
    pub fn next_timeout_ms(&self, now: Instant, default_ms: i32) -> i32 {
        self.splitter.next_timeout_ms(now, default_ms)
    }

    pub fn has_partial(&self) -> bool {
        self.splitter.has_pending()
    }

    pub fn push_unit(&mut self, unit: String) {
        self.units.push_back(unit);
    }

    pub fn pop_unit(&mut self) -> Option<String> {
        self.units.pop_front()
    }

    pub fn pop_key(&mut self) -> Option<KeyPress> {
        self.pop_unit().map(|unit| KeyPress::decode(&unit))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Parameters of a complete `CSI ... <final>` unit with only digits and `;`.
fn report_params(unit: &str, final_byte: char) -> Option<Vec<u16>> {
    let found = extract_at(unit, 0)?;
    if found.family != SequenceFamily::Csi || found.len() != unit.len() {
        return None;
    }
    let body = unit.strip_prefix("\x1b[")?.strip_suffix(final_byte)?;
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit() || b == b';') {
        return None;
    }
    body.split(';').map(|field| field.parse::<u16>().ok()).collect()
}

/// `ESC[row;colR`, 1-based.
pub fn parse_cursor_report(unit: &str) -> Option<Coordinate> {
    match report_params(unit, 'R')?.as_slice() {
        [row, col] => Some(Coordinate::from_report(*row, *col)),
        _ => None,
    }
}

/// `ESC[8;rows;colst`.
pub fn parse_window_report(unit: &str) -> Option<Size> {
    match report_params(unit, 't')?.as_slice() {
        [8, rows, cols] => Some(Size::new(*cols, *rows)),
        _ => None,
    }
}

fn run_query<C, T>(
    channel: &mut C,
    pending: &mut PendingInput,
    query: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T>
where
    C: QueryChannel + ?Sized,
{
    // A held tail would swallow the reply's introducer.
    pending.flush_all();
    let queued_before = pending.len();
    channel.send(query)?;
    tracing::trace!(query = %query.escape_debug(), "terminal query sent");

    loop {
        let chunk = channel.recv_chunk()?;
        pending.feed(&chunk);
        // Only units that arrived after the query can be its reply.
        let hit = pending
            .units
            .iter()
            .skip(queued_before)
            .position(|unit| parse(unit).is_some());
        if let Some(offset) = hit {
            let reply = pending.units.remove(queued_before + offset);
            if let Some(value) = reply.as_deref().and_then(&parse) {
                tracing::debug!(preserved = pending.len(), "terminal query answered");
                return Ok(value);
            }
        }
    }
}

/// Issues `ESC[6n` and waits for the cursor report. The result is 0-based.
pub fn query_cursor_position<C>(channel: &mut C, pending: &mut PendingInput) -> Result<Coordinate>
where
    C: QueryChannel + ?Sized,
{
    run_query(channel, pending, QUERY_CURSOR, parse_cursor_report)
}

/// Issues `ESC[18t` and waits for the text-area size report.
pub fn query_window_size<C>(channel: &mut C, pending: &mut PendingInput) -> Result<Size>
where
    C: QueryChannel + ?Sized,
{
    run_query(channel, pending, QUERY_WINDOW_SIZE, parse_window_report)
}
