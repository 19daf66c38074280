//! Control-sequence classification.
//!
//! Positions are byte offsets into UTF-8 text. 8-bit C1 controls are recognized as the
//! Unicode code points U+0080..=U+009F (two bytes in UTF-8, lead byte 0xC2).

pub const ESC: u8 = 0x1b;
pub const BEL: u8 = 0x07;
/// Lead byte of every U+0080..=U+009F code point in UTF-8.
const C1_LEAD: u8 = 0xc2;

const C1_DCS: u8 = 0x90;
const C1_SS2: u8 = 0x8e;
const C1_SS3: u8 = 0x8f;
const C1_CSI: u8 = 0x9b;
const C1_ST: u8 = 0x9c;
const C1_OSC: u8 = 0x9d;
const C1_PM: u8 = 0x9e;
const C1_APC: u8 = 0x9f;

/// Control-sequence family, identified by introducer and terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SequenceFamily {
    None,
    C1,
    Esc,
    Csi,
    Dcs,
    Osc,
    Apc,
    Pm,
}

impl SequenceFamily {
    /// Every real family, in scan-result order.
    pub const ALL: [SequenceFamily; 7] = [
        SequenceFamily::C1,
        SequenceFamily::Esc,
        SequenceFamily::Csi,
        SequenceFamily::Dcs,
        SequenceFamily::Osc,
        SequenceFamily::Apc,
        SequenceFamily::Pm,
    ];

    pub fn is_string(self) -> bool {
        matches!(
            self,
            SequenceFamily::Dcs | SequenceFamily::Osc | SequenceFamily::Apc | SequenceFamily::Pm
        )
    }
}

/// One recognized sequence inside a scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceMatch<'a> {
    pub family: SequenceFamily,
    pub start: usize,
    pub text: &'a str,
}

impl SequenceMatch<'_> {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte offset one past the last byte of the sequence.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Introducer found at a position: the code that follows ESC, or the 8-bit C1 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Introducer {
    Escape,
    EightBit(u8),
}

impl Introducer {
    fn byte_len(self) -> usize {
        match self {
            Introducer::Escape => 1,
            Introducer::EightBit(_) => 2,
        }
    }
}

fn introducer_at(bytes: &[u8], pos: usize) -> Option<Introducer> {
    match bytes.get(pos)? {
        &ESC => Some(Introducer::Escape),
        &C1_LEAD => match bytes.get(pos + 1) {
            Some(&code) if (0x80..=0x9f).contains(&code) => Some(Introducer::EightBit(code)),
            _ => None,
        },
        _ => None,
    }
}

/// Returns whether `pos` holds an ESC byte or an 8-bit C1 code point.
pub fn is_introducer(text: &str, pos: usize) -> bool {
    introducer_at(text.as_bytes(), pos).is_some()
}

/// Classifies the sequence whose introducer sits at `pos`.
///
/// Only the bytes right after the introducer are inspected; termination is not checked.
/// Anything that is not an introducer, or an ESC followed by an unrecognized byte,
/// classifies as [`SequenceFamily::None`].
pub fn classify(text: &str, pos: usize) -> SequenceFamily {
    let bytes = text.as_bytes();
    match introducer_at(bytes, pos) {
        None => SequenceFamily::None,
        Some(Introducer::EightBit(code)) => classify_eight_bit(code),
        Some(Introducer::Escape) => match bytes.get(pos + 1) {
            Some(&next) => classify_after_escape(next),
            None => SequenceFamily::None,
        },
    }
}

fn classify_eight_bit(code: u8) -> SequenceFamily {
    match code {
        C1_CSI => SequenceFamily::Csi,
        C1_OSC => SequenceFamily::Osc,
        C1_DCS => SequenceFamily::Dcs,
        C1_APC => SequenceFamily::Apc,
        C1_PM => SequenceFamily::Pm,
        _ => SequenceFamily::C1,
    }
}

fn classify_after_escape(next: u8) -> SequenceFamily {
    match next {
        b'[' => SequenceFamily::Csi,
        b']' => SequenceFamily::Osc,
        b'_' => SequenceFamily::Apc,
        b'^' => SequenceFamily::Pm,
        b'P' => SequenceFamily::Dcs,
        // nF (intermediates + final), Fp (private) and Fs (standardized single functions).
        0x20..=0x3f | 0x60..=0x7e => SequenceFamily::Esc,
        // 7-bit representation of the C1 set.
        0x40..=0x5f => SequenceFamily::C1,
        _ => SequenceFamily::None,
    }
}

/// Extracts the complete sequence starting at `pos`.
///
/// Returns `None` when `pos` is not an introducer, the family is unrecognized, or the
/// sequence is malformed or unterminated. Callers treat those bytes as plain text.
pub fn extract_at(text: &str, pos: usize) -> Option<SequenceMatch<'_>> {
    let bytes = text.as_bytes();
    let introducer = introducer_at(bytes, pos)?;
    let family = classify(text, pos);
    let body = match introducer {
        // ESC plus the family byte.
        Introducer::Escape => pos + 2,
        Introducer::EightBit(_) => pos + introducer.byte_len(),
    };

    let end = match family {
        SequenceFamily::None => return None,
        SequenceFamily::Csi => csi_end(bytes, body)?,
        SequenceFamily::Osc | SequenceFamily::Dcs | SequenceFamily::Apc | SequenceFamily::Pm => {
            string_end(bytes, body)?
        }
        SequenceFamily::Esc => esc_end(bytes, pos + 1)?,
        SequenceFamily::C1 => c1_end(bytes, pos, introducer)?,
    };

    Some(SequenceMatch {
        family,
        start: pos,
        text: &text[pos..end],
    })
}

/// Whether the sequence starting at `pos` is cut off by the end of `text` and more input
/// could still complete it. Malformed sequences are not incomplete.
pub fn is_incomplete(text: &str, pos: usize) -> bool {
    let bytes = text.as_bytes();
    let Some(introducer) = introducer_at(bytes, pos) else {
        return false;
    };
    if introducer == Introducer::Escape && pos + 1 == bytes.len() {
        return true;
    }
    // ESC plus one byte, or one two-byte code point.
    let body = pos + 2;
    match classify(text, pos) {
        SequenceFamily::None => false,
        SequenceFamily::Csi => bytes[body..].iter().all(|b| (0x20..=0x3f).contains(b)),
        SequenceFamily::Osc | SequenceFamily::Dcs | SequenceFamily::Apc | SequenceFamily::Pm => {
            let rest = &bytes[body..];
            let head = match rest.split_last() {
                Some((&ESC, head)) => head,
                _ => rest,
            };
            !head.iter().any(|&b| b == BEL || b == ESC)
                && !head.windows(2).any(|pair| *pair == [C1_LEAD, C1_ST])
        }
        SequenceFamily::Esc => bytes[pos + 1..].iter().all(|b| (0x20..=0x2f).contains(b)),
        SequenceFamily::C1 => {
            let code = match introducer {
                Introducer::Escape => bytes[pos + 1] + 0x40,
                Introducer::EightBit(code) => code,
            };
            (code == C1_SS2 || code == C1_SS3) && body == bytes.len()
        }
    }
}

/// Parameter and intermediate bytes run until the first final byte in `0x40..=0x7E`.
fn csi_end(bytes: &[u8], body: usize) -> Option<usize> {
    let mut idx = body;
    while idx < bytes.len() {
        match bytes[idx] {
            0x40..=0x7e => return Some(idx + 1),
            0x20..=0x3f => idx += 1,
            _ => return None,
        }
    }
    None
}

/// String sequences end at BEL, `ESC \`, or the 8-bit ST. Any other ESC aborts the string.
fn string_end(bytes: &[u8], body: usize) -> Option<usize> {
    let mut idx = body;
    while idx < bytes.len() {
        match bytes[idx] {
            BEL => return Some(idx + 1),
            ESC => {
                return (bytes.get(idx + 1) == Some(&b'\\')).then_some(idx + 2);
            }
            C1_LEAD if bytes.get(idx + 1) == Some(&C1_ST) => return Some(idx + 2),
            _ => idx += 1,
        }
    }
    None
}

/// `after_esc` points at the byte right after ESC.
fn esc_end(bytes: &[u8], after_esc: usize) -> Option<usize> {
    let first = *bytes.get(after_esc)?;
    if !(0x20..=0x2f).contains(&first) {
        return Some(after_esc + 1);
    }
    let mut idx = after_esc;
    while idx < bytes.len() {
        match bytes[idx] {
            0x20..=0x2f => idx += 1,
            0x30..=0x7e => return Some(idx + 1),
            _ => return None,
        }
    }
    None
}

fn c1_end(bytes: &[u8], pos: usize, introducer: Introducer) -> Option<usize> {
    let (code, after) = match introducer {
        Introducer::Escape => (bytes[pos + 1] + 0x40, pos + 2),
        Introducer::EightBit(code) => (code, pos + 2),
    };
    if code == C1_SS2 || code == C1_SS3 {
        // Single shifts apply to exactly one following graphic character.
        return match bytes.get(after) {
            Some(0x20..=0x7e) => Some(after + 1),
            _ => None,
        };
    }
    Some(after)
}

#[cfg(test)]
mod tests {
    use super::{classify, extract_at, is_incomplete, SequenceFamily};

    #[test]
    fn classifies_seven_bit_introducers() {
        assert_eq!(classify("\x1b[31m", 0), SequenceFamily::Csi);
        assert_eq!(classify("\x1b]0;t\x07", 0), SequenceFamily::Osc);
        assert_eq!(classify("\x1b_x\x07", 0), SequenceFamily::Apc);
        assert_eq!(classify("\x1b^x\x07", 0), SequenceFamily::Pm);
        assert_eq!(classify("\x1bP1\x1b\\", 0), SequenceFamily::Dcs);
        assert_eq!(classify("\x1b#4", 0), SequenceFamily::Esc);
        assert_eq!(classify("\x1b7", 0), SequenceFamily::Esc);
        assert_eq!(classify("\x1bM", 0), SequenceFamily::C1);
        assert_eq!(classify("\x1b\\", 0), SequenceFamily::C1);
    }

    #[test]
    fn classifies_eight_bit_introducers() {
        assert_eq!(classify("\u{9b}1m", 0), SequenceFamily::Csi);
        assert_eq!(classify("\u{9d}0;t\u{9c}", 0), SequenceFamily::Osc);
        assert_eq!(classify("\u{90}q\u{9c}", 0), SequenceFamily::Dcs);
        assert_eq!(classify("\u{85}", 0), SequenceFamily::C1);
    }

    #[test]
    fn unrecognized_or_missing_follow_byte_is_none() {
        assert_eq!(classify("\x1b", 0), SequenceFamily::None);
        assert_eq!(classify("\x1b\n", 0), SequenceFamily::None);
        assert_eq!(classify("\x1bé", 0), SequenceFamily::None);
        assert_eq!(classify("abc", 1), SequenceFamily::None);
        assert_eq!(classify("abc", 10), SequenceFamily::None);
    }

    #[test]
    fn csi_ends_at_first_final_byte() {
        let text = "\x1b[38;5;43mrest";
        let found = extract_at(text, 0).expect("csi");
        assert_eq!(found.text, "\x1b[38;5;43m");
        assert_eq!(found.end(), 10);
    }

    #[test]
    fn string_sequences_accept_both_terminators() {
        let bel = extract_at("\x1b]0;Hi!\x07x", 0).expect("bel");
        let st = extract_at("\x1b]0;Hi!\x1b\\x", 0).expect("st");
        let st8 = extract_at("\x1b]0;Hi!\u{9c}x", 0).expect("st8");
        assert_eq!(bel.text, "\x1b]0;Hi!\x07");
        assert_eq!(st.text, "\x1b]0;Hi!\x1b\\");
        assert_eq!(st8.text, "\x1b]0;Hi!\u{9c}");
    }

    #[test]
    fn nf_escape_consumes_intermediates() {
        assert_eq!(extract_at("\x1b%Gx", 0).map(|m| m.text), Some("\x1b%G"));
        assert_eq!(extract_at("\x1b(Bx", 0).map(|m| m.text), Some("\x1b(B"));
        assert_eq!(extract_at("\x1b%", 0), None);
    }

    #[test]
    fn single_shift_takes_one_character() {
        assert_eq!(extract_at("\x1bOAx", 0).map(|m| m.text), Some("\x1bOA"));
        assert_eq!(extract_at("\x1bO", 0), None);
        assert_eq!(extract_at("\x1bMx", 0).map(|m| m.text), Some("\x1bM"));
    }

    #[test]
    fn cut_off_sequences_are_incomplete() {
        let cut = [
            "\x1b",
            "\x1b[",
            "\x1b[38;5",
            "\x1b]0;ti",
            "\x1b]0;ti\x1b",
            "\x1b(",
            "\x1bO",
        ];
        for text in cut {
            assert!(is_incomplete(text, 0), "{text:?}");
        }
        assert!(is_incomplete("ab\u{9d}0;t", 2));
        let done_or_broken = ["\x1b[1m", "\x1b[1\n", "\x1b]0;t\x1b[1m", "\x1b]0;t\u{9c}", "\x1bM", "x"];
        for text in done_or_broken {
            assert!(!is_incomplete(text, 0), "{text:?}");
        }
    }

    #[test]
    fn unterminated_sequences_are_rejected() {
        assert_eq!(extract_at("\x1b[38;5", 0), None);
        assert_eq!(extract_at("\x1b]0;title", 0), None);
        assert_eq!(extract_at("\x1b]0;title\x1b[31m", 0), None);
        assert_eq!(extract_at("\x1b[1\n2m", 0), None);
    }
}
