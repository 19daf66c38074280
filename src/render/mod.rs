//! Viewport layout: geometry, scrolling, and soft page breaks.

pub mod soft_page;
pub mod viewport;

pub use soft_page::SoftPageWriter;
pub use viewport::{
    check_console_size, filtered_position, is_overflowing, paginate, paginate_count,
    rows_available, NavDelta, PageState, SizeRequirement, ViewportRect, MINIMUM_HEIGHT,
    MINIMUM_WIDTH,
};
