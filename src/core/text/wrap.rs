//! Width-aware wrapping.
//!
//! Both wrappers split on existing line breaks first, drop carriage returns, and expand
//! tabs to four spaces. Widths are display cells: wide glyphs count double, control
//! sequences count zero. A grapheme wider than the target width gets a line of its own,
//! which is the only way a produced line can exceed `width`.
//!
//! Wrapping is idempotent: wrapping any produced line again at the same width yields
//! exactly that line.

use unicode_segmentation::UnicodeSegmentation;

use super::scanner::{sequences, FamilySet};
use super::sequence::extract_at;
use super::style::SgrTracker;
use super::width::{grapheme_width, next_sequence_or_end, visible_width};

const TAB_EXPANSION: &str = "    ";

fn normalize(text: &str) -> String {
    text.replace('\r', "").replace('\t', TAB_EXPANSION)
}

/// Greedy character wrap.
///
/// A `width` of zero is treated as one.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    normalize(text)
        .split('\n')
        .flat_map(|line| wrap_chars(line, width, String::new(), None))
        .collect()
}

/// Word-preferring wrap: breaks at spaces, and falls back to the character wrap for words
/// that do not fit on a line of their own. SGR styling active at a break is re-emitted at
/// the start of the continuation line.
///
/// A `width` of zero is treated as one.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    normalize(text)
        .split('\n')
        .flat_map(|line| wrap_words_line(line, width))
        .collect()
}

/// Character wrap of one line. `current` seeds the first produced line; when a tracker is
/// given, continuation lines start with its active codes.
fn wrap_chars(
    line: &str,
    width: usize,
    mut current: String,
    mut tracker: Option<&mut SgrTracker>,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_width = visible_width(&current);
    let mut idx = 0;

    while idx < line.len() {
        if let Some(found) = extract_at(line, idx) {
            current.push_str(found.text);
            if let Some(tracker) = tracker.as_deref_mut() {
                tracker.process(found.text);
            }
            idx = found.end();
            continue;
        }

        let run_end = next_sequence_or_end(line, idx);
        for grapheme in line[idx..run_end].graphemes(true) {
            let cells = grapheme_width(grapheme);
            if current_width > 0 && current_width + cells > width {
                lines.push(std::mem::take(&mut current));
                if let Some(tracker) = tracker.as_deref() {
                    current = tracker.active_codes();
                }
                current_width = 0;
            }
            current.push_str(grapheme);
            current_width += cells;
        }
        idx = run_end;
    }

    lines.push(current);
    lines
}

fn wrap_words_line(line: &str, width: usize) -> Vec<String> {
    if visible_width(line) <= width {
        return vec![line.to_string()];
    }

    let mut tracker = SgrTracker::default();
    let mut wrapped: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    // Bytes of `current` that only re-establish styling.
    let mut prefix_len = 0;

    for token in split_words(line) {
        let token_width = visible_width(&token.text);
        let overflows = current_width + token_width > width;

        if token.is_space && overflows {
            if current_width > 0 {
                wrapped.push(current.trim_end().to_string());
                current = tracker.active_codes();
                prefix_len = current.len();
                current_width = 0;
            }
            // Spaces at a break are dropped, their sequences are not.
            for found in sequences(&token.text, FamilySet::ALL) {
                current.push_str(found.text);
                tracker.process(found.text);
            }
            continue;
        }

        if !token.is_space && token_width > width {
            if current_width > 0 {
                wrapped.push(current.trim_end().to_string());
                current = tracker.active_codes();
            }
            let mut pieces = wrap_chars(&token.text, width, current, Some(&mut tracker));
            current = pieces.pop().unwrap_or_default();
            current_width = visible_width(&current);
            prefix_len = 0;
            wrapped.extend(pieces.into_iter().map(|piece| piece.trim_end().to_string()));
            continue;
        }

        if overflows && current_width > 0 {
            wrapped.push(current.trim_end().to_string());
            current = tracker.active_codes();
            current.push_str(&token.text);
            current_width = token_width;
            prefix_len = 0;
        } else {
            current.push_str(&token.text);
            current_width += token_width;
        }

        for found in sequences(&token.text, FamilySet::ALL) {
            tracker.process(found.text);
        }
    }

    match wrapped.last_mut() {
        // Trailing sequences after the last visible cell stay on the last line.
        Some(last) if current_width == 0 => last.push_str(&current[prefix_len..]),
        _ => wrapped.push(current.trim_end().to_string()),
    }
    wrapped
}

#[derive(Debug)]
struct WordToken {
    text: String,
    is_space: bool,
}

/// Splits a line into alternating runs of spaces and non-spaces. Sequences attach to the
/// run that follows them.
fn split_words(line: &str) -> Vec<WordToken> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut pending = String::new();
    let mut in_space = false;
    let mut idx = 0;

    while idx < line.len() {
        if let Some(found) = extract_at(line, idx) {
            pending.push_str(found.text);
            idx = found.end();
            continue;
        }

        let Some(ch) = line[idx..].chars().next() else {
            break;
        };
        let is_space = ch == ' ';
        if is_space != in_space && !current.is_empty() {
            tokens.push(WordToken {
                text: std::mem::take(&mut current),
                is_space: in_space,
            });
        }
        current.push_str(&pending);
        pending.clear();
        in_space = is_space;
        current.push(ch);
        idx += ch.len_utf8();
    }

    current.push_str(&pending);
    if !current.is_empty() {
        tokens.push(WordToken {
            text: current,
            is_space: in_space,
        });
    }
    tokens
}
