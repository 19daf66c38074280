//! Truncation and padding helpers.

use unicode_segmentation::UnicodeSegmentation;

use super::sequence::extract_at;
use super::width::{grapheme_width, next_sequence_or_end, visible_width};

const SGR_RESET: &str = "\x1b[0m";

/// Pads `text` with spaces up to `width` cells. Wider text is returned unchanged.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(text));
    let mut padded = String::with_capacity(text.len() + padding);
    padded.push_str(text);
    padded.extend(std::iter::repeat(' ').take(padding));
    padded
}

/// Cuts `text` to at most `max_width` cells, appending `ellipsis` when anything was cut.
///
/// Sequences before the cut point are kept. When any was kept, a reset is emitted before
/// the ellipsis so styling does not bleed into it.
pub fn truncate_to_width(text: &str, max_width: usize, ellipsis: &str, pad: bool) -> String {
    if max_width == 0 {
        return String::new();
    }

    let text_width = visible_width(text);
    if text_width <= max_width {
        return if pad {
            pad_to_width(text, max_width)
        } else {
            text.to_string()
        };
    }

    let ellipsis_width = visible_width(ellipsis);
    let target_width = max_width.saturating_sub(ellipsis_width);
    if target_width == 0 {
        return ellipsis.chars().take(max_width).collect();
    }

    let mut truncated = String::new();
    let mut kept_sequence = false;
    let mut current_width = 0;
    let mut idx = 0;
    'outer: while idx < text.len() {
        if let Some(found) = extract_at(text, idx) {
            truncated.push_str(found.text);
            kept_sequence = true;
            idx = found.end();
            continue;
        }
        let run_end = next_sequence_or_end(text, idx);
        for grapheme in text[idx..run_end].graphemes(true) {
            let width = grapheme_width(grapheme);
            if current_width + width > target_width {
                break 'outer;
            }
            truncated.push_str(grapheme);
            current_width += width;
        }
        idx = run_end;
    }

    if kept_sequence {
        truncated.push_str(SGR_RESET);
    }
    truncated.push_str(ellipsis);
    if pad {
        pad_to_width(&truncated, max_width)
    } else {
        truncated
    }
}
