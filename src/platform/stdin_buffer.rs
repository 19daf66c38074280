//! Splits raw input bytes into complete key sequences and bracketed pastes.
//!
//! Input arrives in arbitrary chunks, so an escape sequence may be cut anywhere. Incomplete
//! tails stay buffered until the next chunk completes them or the flush deadline passes;
//! a timed-out tail is emitted verbatim (a lone ESC press looks exactly like this).

use std::time::{Duration, Instant};

use crate::core::text::sequence::{classify, SequenceFamily, BEL};

const ESC: char = '\x1b';
const BRACKETED_PASTE_START: &str = "\x1b[200~";
const BRACKETED_PASTE_END: &str = "\x1b[201~";
/// Legacy X10 mouse reports carry three raw bytes after `ESC[M`.
const X10_MOUSE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinEvent {
    Data(String),
    Paste(String),
}

impl StdinEvent {
    /// The event as it appeared on the wire.
    pub fn into_wire(self) -> String {
        match self {
            StdinEvent::Data(data) => data,
            StdinEvent::Paste(content) => {
                format!("{BRACKETED_PASTE_START}{content}{BRACKETED_PASTE_END}")
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SequenceStatus {
    Complete,
    Incomplete,
    NotEscape,
}

#[derive(Debug)]
struct SequenceSplit {
    sequences: Vec<String>,
    remainder: String,
}

#[derive(Debug)]
pub struct StdinBuffer {
    buffer: String,
    timeout: Duration,
    paste_mode: bool,
    paste_buffer: String,
    flush_deadline: Option<Instant>,
}

impl StdinBuffer {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            buffer: String::new(),
            timeout: Duration::from_millis(timeout_ms),
            paste_mode: false,
            paste_buffer: String::new(),
            flush_deadline: None,
        }
    }

    pub fn process(&mut self, data: &[u8]) -> Vec<StdinEvent> {
        self.flush_deadline = None;

        // A lone high byte is a meta-prefixed key from terminals using 8-bit meta.
        let text = if data.len() == 1 && data[0] > 127 {
            let mut converted = String::from(ESC);
            converted.push((data[0] - 128) as char);
            converted
        } else {
            String::from_utf8_lossy(data).into_owned()
        };

        if text.is_empty() {
            return Vec::new();
        }
        self.process_str(&text)
    }

    pub fn flush_due(&mut self, now: Instant) -> Vec<StdinEvent> {
        if self.buffer.is_empty() {
            self.flush_deadline = None;
            return Vec::new();
        }
        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush_events(),
            _ => Vec::new(),
        }
    }

    /// Poll timeout honoring a pending flush deadline.
    pub fn next_timeout_ms(&self, now: Instant, default_ms: i32) -> i32 {
        match self.flush_deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(now);
                let ms = remaining.as_millis().min(i32::MAX as u128) as i32;
                ms.min(default_ms).max(0)
            }
            None => default_ms,
        }
    }

    pub fn flush_events(&mut self) -> Vec<StdinEvent> {
        self.flush_deadline = None;
        if self.buffer.is_empty() {
            return Vec::new();
        }
        vec![StdinEvent::Data(std::mem::take(&mut self.buffer))]
    }

    pub fn clear(&mut self) {
        self.flush_deadline = None;
        self.buffer.clear();
        self.paste_mode = false;
        self.paste_buffer.clear();
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty() || self.paste_mode
    }

    fn process_str(&mut self, data: &str) -> Vec<StdinEvent> {
        let mut events = Vec::new();
        self.buffer.push_str(data);

        if !self.paste_mode {
            let Some(start_index) = self.buffer.find(BRACKETED_PASTE_START) else {
                let split = split_complete_sequences(&self.buffer);
                self.buffer = split.remainder;
                events.extend(split.sequences.into_iter().map(StdinEvent::Data));
                if !self.buffer.is_empty() {
                    self.flush_deadline = Some(Instant::now() + self.timeout);
                }
                return events;
            };

            let split = split_complete_sequences(&self.buffer[..start_index]);
            events.extend(split.sequences.into_iter().map(StdinEvent::Data));
            if !split.remainder.is_empty() {
                events.push(StdinEvent::Data(split.remainder));
            }
            self.buffer.drain(..start_index + BRACKETED_PASTE_START.len());
            self.paste_mode = true;
        }

        self.paste_buffer.push_str(&self.buffer);
        self.buffer.clear();

        if let Some(end_index) = self.paste_buffer.find(BRACKETED_PASTE_END) {
            let pasted = self.paste_buffer[..end_index].to_string();
            let remaining = self.paste_buffer[end_index + BRACKETED_PASTE_END.len()..].to_string();
            self.paste_mode = false;
            self.paste_buffer.clear();

            events.push(StdinEvent::Paste(pasted));
            if !remaining.is_empty() {
                events.extend(self.process_str(&remaining));
            }
        }
        events
    }
}

fn split_complete_sequences(buffer: &str) -> SequenceSplit {
    let mut sequences = Vec::new();
    let mut pos = 0;

    while pos < buffer.len() {
        let rest = &buffer[pos..];
        let Some(first) = rest.chars().next() else {
            break;
        };
        if first != ESC {
            sequences.push(first.to_string());
            pos += first.len_utf8();
            continue;
        }
        // A second ESC starts a new sequence; the first one was a lone key.
        if rest[1..].starts_with(ESC) {
            sequences.push(ESC.to_string());
            pos += 1;
            continue;
        }

        let mut found = None;
        for (offset, ch) in rest.char_indices() {
            let candidate = &rest[..offset + ch.len_utf8()];
            if sequence_status(candidate) != SequenceStatus::Incomplete {
                found = Some(candidate.len());
                break;
            }
        }

        match found {
            Some(len) => {
                sequences.push(rest[..len].to_string());
                pos += len;
            }
            None => {
                return SequenceSplit {
                    sequences,
                    remainder: rest.to_string(),
                }
            }
        }
    }

    SequenceSplit {
        sequences,
        remainder: String::new(),
    }
}

fn sequence_status(data: &str) -> SequenceStatus {
    if !data.starts_with(ESC) {
        return SequenceStatus::NotEscape;
    }
    let bytes = data.as_bytes();
    if bytes.len() == 1 {
        return SequenceStatus::Incomplete;
    }

    match classify(data, 0) {
        SequenceFamily::Csi => csi_status(data),
        family if family.is_string() => {
            if data.len() > 2 && (data.ends_with("\x1b\\") || bytes[bytes.len() - 1] == BEL) {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Incomplete
            }
        }
        // SS2/SS3 carry one more character.
        SequenceFamily::C1 if matches!(bytes[1], b'N' | b'O') => {
            if data.chars().count() >= 3 {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Incomplete
            }
        }
        _ => SequenceStatus::Complete,
    }
}

fn csi_status(data: &str) -> SequenceStatus {
    if data.starts_with("\x1b[M") {
        return if data.len() >= X10_MOUSE_LEN {
            SequenceStatus::Complete
        } else {
            SequenceStatus::Incomplete
        };
    }

    let payload = &data[2..];
    let Some(&last) = payload.as_bytes().last() else {
        return SequenceStatus::Incomplete;
    };
    if !(0x40..=0x7e).contains(&last) {
        return SequenceStatus::Incomplete;
    }

    // SGR mouse: `ESC[<b;x;yM` with three numeric fields, anything else keeps waiting.
    if let Some(inner) = payload.strip_prefix('<') {
        let fields = &inner[..inner.len() - 1];
        let well_formed = matches!(last, b'M' | b'm')
            && fields.split(';').count() == 3
            && fields
                .split(';')
                .all(|field| !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit()));
        return if well_formed {
            SequenceStatus::Complete
        } else {
            SequenceStatus::Incomplete
        };
    }
    SequenceStatus::Complete
}

#[cfg(test)]
mod tests {
    use super::{StdinBuffer, StdinEvent};
    use std::time::{Duration, Instant};

    fn events_to_wire(events: &[StdinEvent]) -> String {
        events.iter().cloned().map(StdinEvent::into_wire).collect()
    }

    fn data(text: &str) -> StdinEvent {
        StdinEvent::Data(text.to_string())
    }

    #[test]
    fn splits_keys_and_sequences() {
        let mut buffer = StdinBuffer::new(10);
        let events = buffer.process("a\x1b[5;10Rb\x1bOP".as_bytes());
        assert_eq!(
            events,
            vec![data("a"), data("\x1b[5;10R"), data("b"), data("\x1bOP")]
        );
        assert!(!buffer.has_pending());
    }

    #[test]
    fn joins_sequences_cut_across_chunks() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b").is_empty());
        assert!(buffer.process(b"[5;1").is_empty());
        assert_eq!(buffer.process(b"0R"), vec![data("\x1b[5;10R")]);

        assert!(buffer.process(b"\x1b[<35").is_empty());
        assert_eq!(buffer.process(b";20;5m"), vec![data("\x1b[<35;20;5m")]);
    }

    #[test]
    fn lone_escape_flushes_after_deadline() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b").is_empty());
        assert!(buffer.flush_due(Instant::now()).is_empty());

        let events = buffer.flush_due(Instant::now() + Duration::from_millis(15));
        assert_eq!(events, vec![data("\x1b")]);
        assert!(buffer
            .flush_due(Instant::now() + Duration::from_millis(50))
            .is_empty());
    }

    #[test]
    fn string_sequences_wait_for_terminator() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b]11;rgb:0/0/0").is_empty());
        assert_eq!(
            buffer.process(b"\x07"),
            vec![data("\x1b]11;rgb:0/0/0\x07")]
        );
        assert!(buffer.process(b"\x1bP1$r0m\x1b").is_empty());
        assert_eq!(buffer.process(b"\\"), vec![data("\x1bP1$r0m\x1b\\")]);
    }

    #[test]
    fn alt_with_multibyte_char_is_one_unit() {
        let mut buffer = StdinBuffer::new(10);
        assert_eq!(buffer.process("\x1bé".as_bytes()), vec![data("\x1bé")]);
    }

    #[test]
    fn emits_paste_event_and_preserves_order() {
        let mut buffer = StdinBuffer::new(10);
        let mut events = Vec::new();
        events.extend(buffer.process(b"a"));
        events.extend(buffer.process(b"\x1b[200~xy"));
        events.extend(buffer.process(b"\x1b[201~\x1b[A"));
        events.extend(buffer.process(b"b"));

        assert_eq!(
            events,
            vec![
                data("a"),
                StdinEvent::Paste("xy".to_string()),
                data("\x1b[A"),
                data("b"),
            ]
        );
        assert_eq!(events_to_wire(&events), "a\x1b[200~xy\x1b[201~\x1b[Ab");
    }

    #[test]
    fn malformed_tail_is_flushed_verbatim() {
        let mut buffer = StdinBuffer::new(10);
        let input = "a\x1b[<35;1;xm\x1b[AZ";

        let mut events = buffer.process(input.as_bytes());
        assert_eq!(events, vec![data("a")]);
        events.extend(buffer.flush_due(Instant::now() + Duration::from_millis(25)));
        assert_eq!(events_to_wire(&events), input);
    }

    #[test]
    fn clear_resets_deadline() {
        let mut buffer = StdinBuffer::new(25);
        assert!(buffer.process(b"\x1b[").is_empty());
        assert!(buffer.next_timeout_ms(Instant::now(), 1000) <= 25);

        buffer.clear();
        assert_eq!(buffer.next_timeout_ms(Instant::now(), 77), 77);
        assert_eq!(buffer.buffer(), "");
    }

    #[test]
    fn doubled_escape_starts_a_new_sequence() {
        let mut buffer = StdinBuffer::new(10);
        assert!(buffer.process(b"\x1b").is_empty());
        assert_eq!(
            buffer.process(b"\x1b[5;10R"),
            vec![data("\x1b"), data("\x1b[5;10R")]
        );
        assert_eq!(
            buffer.process(b"\x1b\x1b\x1bOP"),
            vec![data("\x1b"), data("\x1b"), data("\x1bOP")]
        );
    }

    #[test]
    fn high_byte_is_meta_prefix() {
        let mut buffer = StdinBuffer::new(10);
        assert_eq!(buffer.process(&[b'x' + 128]), vec![data("\x1bx")]);
    }
}
