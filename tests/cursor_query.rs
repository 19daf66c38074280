use std::collections::VecDeque;

use console_vt::{
    query_cursor_position, query_window_size, ConsolePort, ConsoleError, Coordinate, Key,
    PendingInput, QueryChannel, Result, Size, VirtualTerminal,
};
use pretty_assertions::assert_eq;

/// Replays canned input chunks and records what was sent.
struct ScriptedChannel {
    sent: Vec<String>,
    chunks: VecDeque<&'static str>,
}

impl ScriptedChannel {
    fn new(chunks: &[&'static str]) -> Self {
        Self {
            sent: Vec::new(),
            chunks: chunks.iter().copied().collect(),
        }
    }
}

impl QueryChannel for ScriptedChannel {
    fn send(&mut self, query: &str) -> Result<()> {
        self.sent.push(query.to_string());
        Ok(())
    }

    fn recv_chunk(&mut self) -> Result<Vec<u8>> {
        self.chunks
            .pop_front()
            .map(|chunk| chunk.as_bytes().to_vec())
            .ok_or_else(|| {
                ConsoleError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "script exhausted",
                ))
            })
    }
}

fn drain_keys(pending: &mut PendingInput) -> Vec<Key> {
    std::iter::from_fn(|| pending.pop_key())
        .map(|press| press.key)
        .collect()
}

#[test]
fn cursor_report_is_converted_to_zero_based() {
    let mut channel = ScriptedChannel::new(&["\x1b[5;10R"]);
    let mut pending = PendingInput::new();
    let position = query_cursor_position(&mut channel, &mut pending).expect("position");
    assert_eq!(position, Coordinate::new(9, 4));
    assert_eq!(channel.sent, vec!["\x1b[6n".to_string()]);
    assert!(pending.is_empty());
}

#[test]
fn keys_around_the_reply_are_kept_in_order() {
    let mut channel = ScriptedChannel::new(&["x", "y\x1b[2;3Rz"]);
    let mut pending = PendingInput::new();
    let position = query_cursor_position(&mut channel, &mut pending).expect("position");
    assert_eq!(position, Coordinate::new(2, 1));
    assert_eq!(
        drain_keys(&mut pending),
        vec![Key::Char('x'), Key::Char('y'), Key::Char('z')]
    );
}

#[test]
fn reply_split_across_reads_is_reassembled() {
    let mut channel = ScriptedChannel::new(&["\x1b[12", ";4", "0R"]);
    let mut pending = PendingInput::new();
    let position = query_cursor_position(&mut channel, &mut pending).expect("position");
    assert_eq!(position, Coordinate::new(39, 11));
}

#[test]
fn unrelated_sequences_are_not_mistaken_for_the_reply() {
    let mut channel = ScriptedChannel::new(&["\x1b[A\x1b[8;24;80t", "\x1b[1;1R"]);
    let mut pending = PendingInput::new();
    let position = query_cursor_position(&mut channel, &mut pending).expect("position");
    assert_eq!(position, Coordinate::ORIGIN);
    // The size report is not a cursor reply, so it stays queued with the arrow key.
    assert_eq!(pending.len(), 2);
    assert_eq!(pending.pop_key().map(|press| press.key), Some(Key::Up));
}

#[test]
fn window_size_query_reads_the_text_area_report() {
    let mut channel = ScriptedChannel::new(&["q\x1b[8;43;132t"]);
    let mut pending = PendingInput::new();
    let size = query_window_size(&mut channel, &mut pending).expect("size");
    assert_eq!(size, Size::new(132, 43));
    assert_eq!(channel.sent, vec!["\x1b[18t".to_string()]);
    assert_eq!(drain_keys(&mut pending), vec![Key::Char('q')]);
}

#[test]
fn silent_terminal_surfaces_the_read_error() {
    let mut channel = ScriptedChannel::new(&["k"]);
    let mut pending = PendingInput::new();
    let err = query_cursor_position(&mut channel, &mut pending).unwrap_err();
    assert!(matches!(err, ConsoleError::Io(_)));
    assert_eq!(drain_keys(&mut pending), vec![Key::Char('k')]);
}

#[test]
fn virtual_terminal_answers_from_its_own_cursor() {
    let mut term = VirtualTerminal::new(Size::new(40, 10));
    term.set_raw_mode(true);
    term.push_input("ab");
    term.write("line one\nabc").expect("write");

    assert_eq!(
        term.cursor_position().expect("position"),
        Coordinate::new(3, 1)
    );
    assert_eq!(term.queries_seen(), 1);
    assert_eq!(term.pending_keys(), 2);
    assert_eq!(term.read_key().expect("key").key, Key::Char('a'));
    assert_eq!(term.read_key().expect("key").key, Key::Char('b'));
}

#[test]
fn query_after_moving_the_cursor_reports_the_new_position() {
    let mut term = VirtualTerminal::new(Size::new(80, 24));
    term.set_raw_mode(true);
    term.set_cursor_position(Coordinate::new(17, 6))
        .expect("move");
    assert_eq!(
        term.cursor_position().expect("position"),
        Coordinate::new(17, 6)
    );
}
