//! Viewport geometry and continuous scrolling over wrapped lines.

use std::ops::Range;
use std::process::Command;

use unicode_segmentation::UnicodeSegmentation;

use crate::config::EnvConfig;
use crate::core::cursor::{Coordinate, Size};
use crate::core::port::{effective_window_size, ConsolePort};
use crate::core::text::scanner::strip;
use crate::core::text::width::grapheme_width;
use crate::error::{ConsoleError, Result};

pub const MINIMUM_WIDTH: u16 = 80;
pub const MINIMUM_HEIGHT: u16 = 24;

/// Rectangle in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportRect {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
}

impl ViewportRect {
    pub fn new(left: u16, top: u16, width: u16, height: u16) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Full-window viewport anchored at the origin.
    pub fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// The area inside a border `border` cells thick on every side.
    pub fn inner(&self, border: u16) -> Self {
        let twice = border.saturating_mul(2);
        Self {
            left: self.left.saturating_add(border),
            top: self.top.saturating_add(border),
            width: self.width.saturating_sub(twice),
            height: self.height.saturating_sub(twice),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.width == u16::MAX || self.height == u16::MAX
    }
}

/// Rows left for content after `reserved` rows of headers, footers, or borders.
pub fn rows_available(rect: ViewportRect, reserved: usize) -> usize {
    usize::from(rect.height).saturating_sub(reserved)
}

pub fn is_overflowing<T>(lines: &[T], viewport_height: usize, reserved: usize) -> bool {
    lines.len() > viewport_height.saturating_sub(reserved)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDelta {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    Home,
    End,
    By(isize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageState {
    pub start_index: usize,
    /// Exclusive.
    pub end_index: usize,
    pub current_line: usize,
    pub total_lines: usize,
    pub page_size: usize,
}

impl PageState {
    pub fn page_count(&self) -> usize {
        if self.total_lines == 0 {
            return 1;
        }
        self.total_lines.div_ceil(self.page_size.max(1))
    }

    /// Zero-based page holding `current_line`.
    pub fn current_page(&self) -> usize {
        self.current_line / self.page_size.max(1)
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }
}

/// Applies `delta` to a scroll position and clamps the new top line to
/// `[0, max(0, total_lines - viewport_height)]`.
pub fn paginate<T>(
    lines: &[T],
    viewport_height: usize,
    current_top: usize,
    delta: NavDelta,
) -> PageState {
    paginate_count(lines.len(), viewport_height, current_top, delta)
}

pub fn paginate_count(
    total_lines: usize,
    viewport_height: usize,
    current_top: usize,
    delta: NavDelta,
) -> PageState {
    let height = viewport_height.max(1);
    let max_top = total_lines.saturating_sub(height);
    let top = current_top.min(max_top);

    let moved = match delta {
        NavDelta::LineUp => top.saturating_sub(1),
        NavDelta::LineDown => top.saturating_add(1),
        NavDelta::PageUp => top.saturating_sub(height),
        NavDelta::PageDown => top.saturating_add(height),
        NavDelta::Home => 0,
        NavDelta::End => max_top,
        NavDelta::By(offset) => top.saturating_add_signed(offset),
    };
    let start = moved.min(max_top);

    PageState {
        start_index: start,
        end_index: start.saturating_add(height).min(total_lines),
        current_line: start,
        total_lines,
        page_size: height,
    }
}

/// Smallest window a full-screen layout needs.
///
/// Each tmux status bar hides one window row, so `status_rows` is taken off the
/// minimum height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRequirement {
    pub minimum: Size,
    pub status_rows: u16,
}

impl Default for SizeRequirement {
    fn default() -> Self {
        Self::new(Size::new(MINIMUM_WIDTH, MINIMUM_HEIGHT))
    }
}

impl SizeRequirement {
    pub fn new(minimum: Size) -> Self {
        Self {
            minimum,
            status_rows: 0,
        }
    }

    /// The 80x24 default, less the tmux status bars when running inside tmux.
    pub fn for_environment(config: &EnvConfig) -> Self {
        let mut requirement = Self::default();
        if config.in_tmux {
            requirement.status_rows = tmux_status_rows();
        }
        requirement
    }

    pub fn effective_minimum(&self) -> Size {
        Size::new(
            self.minimum.width,
            self.minimum.height.saturating_sub(self.status_rows),
        )
    }

    pub fn is_met(&self, size: Size) -> bool {
        let minimum = self.effective_minimum();
        size.width >= minimum.width && size.height >= minimum.height
    }

    /// Reads the window size from `port` and fails with `WindowTooSmall` below the
    /// minimum. Dumb ports report the unbounded sentinel and always pass.
    pub fn check(&self, port: &mut dyn ConsolePort) -> Result<Size> {
        let size = effective_window_size(port)?;
        if self.is_met(size) {
            return Ok(size);
        }
        let minimum = self.effective_minimum();
        tracing::warn!(%size, %minimum, "console window too small");
        Err(ConsoleError::WindowTooSmall { size, minimum })
    }
}

/// Checks `port` against the default requirement for the current environment.
pub fn check_console_size(port: &mut dyn ConsolePort, config: &EnvConfig) -> Result<Size> {
    SizeRequirement::for_environment(config).check(port)
}

/// Falls back to one status bar when tmux cannot be asked.
fn tmux_status_rows() -> u16 {
    match Command::new("tmux")
        .args(["show-options", "-v", "-g", "status"])
        .output()
    {
        Ok(output) if output.status.success() => {
            parse_status_rows(&String::from_utf8_lossy(&output.stdout)).unwrap_or(1)
        }
        Ok(output) => {
            tracing::debug!(status = %output.status, "tmux status query failed");
            1
        }
        Err(err) => {
            tracing::debug!(%err, "tmux status query failed");
            1
        }
    }
}

/// tmux reports `on`, `off`, or the number of status lines.
fn parse_status_rows(value: &str) -> Option<u16> {
    match value.trim() {
        "on" => Some(1),
        "off" => Some(0),
        other => other.parse().ok(),
    }
}

/// Where the cursor ends up after writing `text` at `start` in a window of `size`.
///
/// Sequences take no cells, carriage returns and NULs are dropped, and a newline moves to
/// the start of the next row. Text wraps at the window width and rows stop at the bottom
/// edge.
pub fn filtered_position(text: &str, start: Coordinate, size: Size) -> Coordinate {
    let visible: String = strip(text)
        .chars()
        .filter(|ch| *ch != '\r' && *ch != '\0')
        .collect();
    let width = usize::from(size.width.max(1));
    let last_row = usize::from(size.height.max(1) - 1);
    let mut x = usize::from(start.x);
    let mut y = usize::from(start.y);

    for grapheme in visible.graphemes(true) {
        if grapheme == "\n" {
            y = (y + 1).min(last_row);
            x = 0;
            continue;
        }
        let cells = grapheme_width(grapheme);
        if cells == 0 {
            continue;
        }
        if x > 0 && x + cells > width {
            x = 0;
            y = (y + 1).min(last_row);
        }
        x += cells;
        if x >= width {
            x = 0;
            y = (y + 1).min(last_row);
        }
    }

    Coordinate::new(
        u16::try_from(x).unwrap_or(u16::MAX),
        u16::try_from(y).unwrap_or(u16::MAX),
    )
}
