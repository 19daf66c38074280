//! Decoding of one raw input sequence into a key press.
//!
//! Covers legacy VT/xterm encodings (including the `ESC[1;<mod>X` and `ESC[<n>;<mod>~`
//! modifier forms) and the kitty `CSI <codepoint>;<mod> u` form. Anything else decodes to
//! [`Key::Unknown`] with the raw text kept.

use bitflags::bitflags;

use crate::core::text::sequence::{extract_at, SequenceFamily};

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const ALT = 2;
        const CTRL = 4;
    }
}

impl Modifiers {
    /// xterm encodes modifiers as `1 + bits`; lock bits are dropped.
    fn from_param(param: u16) -> Self {
        let bits = param.saturating_sub(1) as u8;
        Modifiers::from_bits_truncate(bits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Clear,
    F(u8),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
    /// The input exactly as received.
    pub raw: String,
}

impl KeyPress {
    pub fn new(key: Key, modifiers: Modifiers, raw: impl Into<String>) -> Self {
        Self {
            key,
            modifiers,
            raw: raw.into(),
        }
    }

    /// Decodes one complete input unit, as produced by the input buffer.
    pub fn decode(raw: &str) -> Self {
        let (key, modifiers) = decode_parts(raw).unwrap_or((Key::Unknown, Modifiers::empty()));
        Self::new(key, modifiers, raw)
    }

    pub fn is(&self, key: Key) -> bool {
        self.key == key && self.modifiers.is_empty()
    }

    pub fn is_ctrl(&self, ch: char) -> bool {
        self.key == Key::Char(ch) && self.modifiers == Modifiers::CTRL
    }

    /// The printable character carried by an unmodified (or shifted) char key.
    pub fn printable(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) if (self.modifiers - Modifiers::SHIFT).is_empty() && !ch.is_control() => {
                Some(ch)
            }
            _ => None,
        }
    }
}

fn decode_parts(raw: &str) -> Option<(Key, Modifiers)> {
    let none = Modifiers::empty();
    match raw {
        "" => return None,
        "\x1b" => return Some((Key::Escape, none)),
        "\r" | "\n" | "\x1bOM" => return Some((Key::Enter, none)),
        "\t" => return Some((Key::Tab, none)),
        "\x1b[Z" => return Some((Key::Tab, Modifiers::SHIFT)),
        "\x7f" | "\x08" => return Some((Key::Backspace, none)),
        "\x00" => return Some((Key::Char(' '), Modifiers::CTRL)),
        _ => {}
    }

    if let Some(decoded) = legacy_key(raw) {
        return Some(decoded);
    }

    let mut chars = raw.chars();
    let first = chars.next()?;
    if chars.next().is_none() {
        return Some(single_char(first));
    }

    let sequence_key = extract_at(raw, 0)
        .filter(|found| found.len() == raw.len())
        .and_then(|found| match found.family {
            SequenceFamily::Csi => csi_key(raw),
            SequenceFamily::C1 => ss3_key(raw),
            _ => None,
        });
    if sequence_key.is_some() {
        return sequence_key;
    }

    // Alt sends ESC ahead of the plain key.
    let rest = raw.strip_prefix('\x1b')?;
    let (key, modifiers) = decode_parts(rest)?;
    Some((key, modifiers | Modifiers::ALT))
}

fn single_char(ch: char) -> (Key, Modifiers) {
    match ch {
        '\u{1}'..='\u{1a}' => {
            let letter = (b'a' + (ch as u8 - 1)) as char;
            (Key::Char(letter), Modifiers::CTRL)
        }
        '\u{1c}' => (Key::Char('\\'), Modifiers::CTRL),
        '\u{1d}' => (Key::Char(']'), Modifiers::CTRL),
        '\u{1f}' => (Key::Char('-'), Modifiers::CTRL),
        ch if ch.is_uppercase() => (Key::Char(ch), Modifiers::SHIFT),
        ch => (Key::Char(ch), Modifiers::empty()),
    }
}

fn legacy_key(raw: &str) -> Option<(Key, Modifiers)> {
    let none = Modifiers::empty();
    let shift = Modifiers::SHIFT;
    let ctrl = Modifiers::CTRL;
    let decoded = match raw {
        "\x1b[E" | "\x1bOE" => (Key::Clear, none),
        "\x1b[e" => (Key::Clear, shift),
        "\x1bOe" => (Key::Clear, ctrl),
        "\x1b[[A" => (Key::F(1), none),
        "\x1b[[B" => (Key::F(2), none),
        "\x1b[[C" => (Key::F(3), none),
        "\x1b[[D" => (Key::F(4), none),
        "\x1b[[E" => (Key::F(5), none),
        "\x1b[[5~" => (Key::PageUp, none),
        "\x1b[[6~" => (Key::PageDown, none),
        "\x1b[a" => (Key::Up, shift),
        "\x1b[b" => (Key::Down, shift),
        "\x1b[c" => (Key::Right, shift),
        "\x1b[d" => (Key::Left, shift),
        "\x1bOa" => (Key::Up, ctrl),
        "\x1bOb" => (Key::Down, ctrl),
        "\x1bOc" => (Key::Right, ctrl),
        "\x1bOd" => (Key::Left, ctrl),
        "\x1b[2$" => (Key::Insert, shift),
        "\x1b[3$" => (Key::Delete, shift),
        "\x1b[5$" => (Key::PageUp, shift),
        "\x1b[6$" => (Key::PageDown, shift),
        "\x1b[7$" => (Key::Home, shift),
        "\x1b[8$" => (Key::End, shift),
        "\x1b[2^" => (Key::Insert, ctrl),
        "\x1b[3^" => (Key::Delete, ctrl),
        "\x1b[5^" => (Key::PageUp, ctrl),
        "\x1b[6^" => (Key::PageDown, ctrl),
        "\x1b[7^" => (Key::Home, ctrl),
        "\x1b[8^" => (Key::End, ctrl),
        _ => return None,
    };
    Some(decoded)
}

/// `ESC O <final>` application-mode keys.
fn ss3_key(raw: &str) -> Option<(Key, Modifiers)> {
    let final_char = raw.strip_prefix("\x1bO")?.chars().next()?;
    letter_key(final_char).map(|key| (key, Modifiers::empty()))
}

fn letter_key(final_char: char) -> Option<Key> {
    let key = match final_char {
        'A' => Key::Up,
        'B' => Key::Down,
        'C' => Key::Right,
        'D' => Key::Left,
        'H' => Key::Home,
        'F' => Key::End,
        'P' => Key::F(1),
        'Q' => Key::F(2),
        'R' => Key::F(3),
        'S' => Key::F(4),
        _ => return None,
    };
    Some(key)
}

fn tilde_key(code: u16) -> Option<Key> {
    let key = match code {
        1 | 7 => Key::Home,
        2 => Key::Insert,
        3 => Key::Delete,
        4 | 8 => Key::End,
        5 => Key::PageUp,
        6 => Key::PageDown,
        11..=15 => Key::F((code - 10) as u8),
        17..=21 => Key::F((code - 11) as u8),
        23 | 24 => Key::F((code - 12) as u8),
        _ => return None,
    };
    Some(key)
}

fn codepoint_key(codepoint: u32) -> Option<Key> {
    let key = match codepoint {
        9 => Key::Tab,
        13 | 57414 => Key::Enter,
        27 => Key::Escape,
        127 => Key::Backspace,
        cp => Key::Char(char::from_u32(cp)?),
    };
    Some(key)
}

fn csi_key(raw: &str) -> Option<(Key, Modifiers)> {
    let body = raw.strip_prefix("\x1b[")?;
    let final_char = body.chars().last()?;
    let params = &body[..body.len() - final_char.len_utf8()];
    if params.starts_with(&['<', '?', '>'][..]) {
        return None;
    }

    // Sub-parameters (`:`) carry event types and alternate keys; only the first value counts.
    let mut fields = params
        .split(';')
        .map(|field| field.split(':').next().unwrap_or_default());
    let first = fields.next().unwrap_or_default();
    let modifiers = fields
        .next()
        .and_then(|field| field.parse::<u16>().ok())
        .map(Modifiers::from_param)
        .unwrap_or_default();

    let key = match final_char {
        '~' => tilde_key(first.parse().ok()?)?,
        'u' => codepoint_key(first.parse().ok()?)?,
        other => letter_key(other)?,
    };
    Some((key, modifiers))
}
