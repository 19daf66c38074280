//! Display-cell width of text. Control sequences occupy zero cells.

use emojis::get as emoji_get;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::sequence::extract_at;

pub const TAB_WIDTH: usize = 4;

pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }
    if grapheme == "\t" {
        return TAB_WIDTH;
    }
    if emoji_get(grapheme).is_some() {
        return 2;
    }

    grapheme
        .chars()
        .map(|ch| {
            if ch == '\t' {
                TAB_WIDTH
            } else {
                UnicodeWidthChar::width(ch).unwrap_or(0)
            }
        })
        .sum()
}

/// Byte offset of the next recognized sequence at or after `idx`, or the end of `text`.
pub(crate) fn next_sequence_or_end(text: &str, mut idx: usize) -> usize {
    while idx < text.len() {
        if extract_at(text, idx).is_some() {
            break;
        }
        idx += text[idx..].chars().next().map_or(1, char::len_utf8);
    }
    idx
}

pub fn visible_width(input: &str) -> usize {
    let mut width = 0;
    let mut idx = 0;
    while idx < input.len() {
        if let Some(found) = extract_at(input, idx) {
            idx = found.end();
            continue;
        }
        let run_end = next_sequence_or_end(input, idx);
        width += input[idx..run_end]
            .graphemes(true)
            .map(grapheme_width)
            .sum::<usize>();
        idx = run_end;
    }
    width
}
