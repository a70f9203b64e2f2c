//! Layout module: Screen regions for the log pane and status row.
//!
//! Layouts are computed once at startup and again on terminal resize.

mod rect;

pub use rect::Rect;

/// Rows reserved for the status line.
pub const STATUS_ROWS: u16 = 1;

/// Where each pane sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// The scrolling log pane.
    pub log: Rect,
    /// The status line.
    pub status: Rect,
}

impl Layout {
    /// Compute the layout for a terminal of the given size.
    pub fn for_size(width: u16, height: u16) -> Self {
        let (log, status) = Rect::from_size(width, height).split_bottom(STATUS_ROWS);
        Self { log, status }
    }
}
