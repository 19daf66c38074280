//! Paged selection list.
//!
//! The list owns its choices only. The highlight and page position live in a
//! [`SelectionState`] the caller passes in and gets back, so a list can be driven by any
//! number of independent sessions.

use crate::core::text::utils::truncate_to_width;
use crate::error::{ConsoleError, Result};
use crate::render::viewport::{rows_available, NavDelta, PageState, ViewportRect};

const STATUS_ROWS: usize = 1;
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceItem {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub disabled: bool,
    /// Highlighted when the list opens.
    pub default: bool,
}

impl ChoiceItem {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: None,
            disabled: false,
            default: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }
}

/// One choice or a list of them, fixed when the list is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Choice {
    Single(ChoiceItem),
    Many(Vec<ChoiceItem>),
}

impl Choice {
    pub fn into_items(self) -> Vec<ChoiceItem> {
        match self {
            Choice::Single(item) => vec![item],
            Choice::Many(items) => items,
        }
    }
}

impl From<ChoiceItem> for Choice {
    fn from(item: ChoiceItem) -> Self {
        Choice::Single(item)
    }
}

impl From<Vec<ChoiceItem>> for Choice {
    fn from(items: Vec<ChoiceItem>) -> Self {
        Choice::Many(items)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionState {
    pub highlighted: usize,
    pub page: PageState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct SelectionList {
    items: Vec<ChoiceItem>,
}

impl SelectionList {
    /// Fails with [`ConsoleError::NoEnabledChoice`] unless some choice is enabled.
    pub fn new(choice: impl Into<Choice>) -> Result<Self> {
        let items = choice.into().into_items();
        if items.iter().all(|item| item.disabled) {
            return Err(ConsoleError::NoEnabledChoice);
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[ChoiceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Opening state: the first enabled default, else the first enabled choice.
    pub fn initial_state(&self, viewport: ViewportRect) -> SelectionState {
        let start = self
            .items
            .iter()
            .position(|item| item.default && !item.disabled)
            .unwrap_or(0);
        let highlighted = self.settle(start, Direction::Down, true);
        self.state_at(highlighted, self.page_size(viewport))
    }

    /// Recomputes paging after the viewport changed size.
    pub fn relayout(&self, state: SelectionState, viewport: ViewportRect) -> SelectionState {
        self.state_at(state.highlighted, self.page_size(viewport))
    }

    pub fn handle(&self, state: SelectionState, nav: NavDelta) -> SelectionState {
        let last = self.items.len() - 1;
        let page_size = state.page.page_size.max(1);
        let current = state.highlighted.min(last);
        let page_start = current / page_size * page_size;

        let (target, direction, wrap) = match nav {
            NavDelta::LineUp => (
                if current == 0 { last } else { current - 1 },
                Direction::Up,
                true,
            ),
            NavDelta::LineDown => (
                if current == last { 0 } else { current + 1 },
                Direction::Down,
                true,
            ),
            NavDelta::PageUp => (page_start.saturating_sub(1), Direction::Up, false),
            NavDelta::PageDown => ((page_start + page_size).min(last), Direction::Down, false),
            NavDelta::Home => (0, Direction::Down, false),
            NavDelta::End => (last, Direction::Up, false),
            NavDelta::By(offset) => {
                let direction = if offset < 0 {
                    Direction::Up
                } else {
                    Direction::Down
                };
                (current.saturating_add_signed(offset).min(last), direction, false)
            }
        };

        let highlighted = self.settle(target, direction, wrap);
        self.state_at(highlighted, page_size)
    }

    pub fn selected(&self, state: &SelectionState) -> Option<&ChoiceItem> {
        self.items
            .get(state.highlighted)
            .filter(|item| !item.disabled)
    }

    /// Rows for the current page, each cut to the viewport width, plus a position line
    /// when the list spans more than one page.
    pub fn render(&self, state: &SelectionState, viewport: ViewportRect) -> Vec<String> {
        let width = usize::from(viewport.width);
        let mut lines = Vec::with_capacity(state.page.page_size + STATUS_ROWS);

        for idx in state.page.visible_range() {
            let Some(item) = self.items.get(idx) else {
                continue;
            };
            let marker = if idx == state.highlighted { "> " } else { "  " };
            let row = if item.disabled {
                format!("{marker}{DIM}{}) {}{RESET}", item.name, item.title)
            } else {
                format!("{marker}{}) {}", item.name, item.title)
            };
            lines.push(truncate_to_width(&row, width, "...", false));
        }

        if state.page.page_count() > 1 {
            let status = format!(
                "  [{}/{}] page {}/{}",
                state.highlighted + 1,
                self.items.len(),
                state.page.current_page() + 1,
                state.page.page_count()
            );
            lines.push(truncate_to_width(&status, width, "", false));
        }
        lines
    }

    fn page_size(&self, viewport: ViewportRect) -> usize {
        let rows = usize::from(viewport.height);
        if self.items.len() <= rows {
            rows.max(1)
        } else {
            rows_available(viewport, STATUS_ROWS).max(1)
        }
    }

    fn state_at(&self, highlighted: usize, page_size: usize) -> SelectionState {
        let total = self.items.len();
        let start = highlighted / page_size * page_size;
        SelectionState {
            highlighted,
            page: PageState {
                start_index: start,
                end_index: (start + page_size).min(total),
                current_line: highlighted,
                total_lines: total,
                page_size,
            },
        }
    }

    /// Nearest enabled index from `from`, moving in `direction`. Without wrapping, the
    /// search turns around at the end of the list.
    fn settle(&self, from: usize, direction: Direction, wrap: bool) -> usize {
        let len = self.items.len();
        let enabled = |idx: usize| !self.items[idx].disabled;
        if wrap {
            let mut idx = from;
            for _ in 0..len {
                if enabled(idx) {
                    return idx;
                }
                idx = match direction {
                    Direction::Down => (idx + 1) % len,
                    Direction::Up => (idx + len - 1) % len,
                };
            }
            return from;
        }
        let mut order: Box<dyn Iterator<Item = usize>> = match direction {
            Direction::Down => Box::new((from..len).chain((0..from).rev())),
            Direction::Up => Box::new((0..=from).rev().chain(from + 1..len)),
        };
        order.find(|idx| enabled(*idx)).unwrap_or(from)
    }
}
