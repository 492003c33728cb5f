#![forbid(unsafe_code)]

//! Maps a scroll position onto the rows that need rendering.
//!
//! Rows have arbitrary pixel heights, so the visible range cannot be derived
//! by division. [`resolve`] descends the prefix-sum tree in [`RowHeights`]
//! twice, once for each viewport edge, and then widens the result by the
//! overscan count.

use std::ops::Range;

use crate::heights::RowHeights;

/// Scroll position and size of the visible pixel window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    pub scroll_offset: u32,
    /// Signed so hosts can pass unvalidated layout results; non-positive
    /// heights resolve to an empty window.
    pub viewport_height: i32,
    pub overscan: usize,
}

impl ViewportState {
    #[must_use]
    pub const fn new(scroll_offset: u32, viewport_height: i32, overscan: usize) -> Self {
        Self {
            scroll_offset,
            viewport_height,
            overscan,
        }
    }

    /// Resolve this viewport against `heights`.
    #[must_use]
    pub fn resolve(&self, heights: &RowHeights) -> Window {
        resolve(self.scroll_offset, self.viewport_height, heights, self.overscan)
    }
}

/// Rows intersecting the viewport, with and without overscan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Window {
    /// Rows with at least one pixel inside the viewport.
    pub visible: Range<usize>,
    /// `visible` widened by the overscan on both sides, clamped to the rows.
    pub render: Range<usize>,
}

impl Window {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            visible: 0..0,
            render: 0..0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.render.is_empty()
    }
}

/// Resolve the window for `viewport_height` pixels starting at `scroll_offset`.
///
/// The viewport covers pixels `[scroll_offset, scroll_offset + viewport_height)`.
/// An offset past the content clamps to the last row, and a row taller than
/// the viewport comes back alone rather than as an empty range.
#[must_use]
pub fn resolve(scroll_offset: u32, viewport_height: i32, heights: &RowHeights, overscan: usize) -> Window {
    let len = heights.len();
    let Ok(viewport) = u32::try_from(viewport_height) else {
        return Window::empty();
    };
    if viewport == 0 {
        return Window::empty();
    }
    let (Some(first), Some(last)) = (
        heights.row_at_offset(scroll_offset),
        heights.row_at_offset(scroll_offset.saturating_add(viewport - 1)),
    ) else {
        return Window::empty();
    };

    let visible = first..(last + 1).max(first + 1);
    let render = visible.start.saturating_sub(overscan)..visible.end.saturating_add(overscan).min(len);
    Window { visible, render }
}

/// Largest scroll offset that still fills the viewport.
#[must_use]
pub fn max_scroll_offset(total_height: u32, viewport_height: i32) -> u32 {
    let viewport = u32::try_from(viewport_height).unwrap_or(0);
    total_height.saturating_sub(viewport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_rows() {
        let heights = RowHeights::with_uniform(1_000, 60);
        let window = resolve(5_000, 800, &heights, 0);
        // Row 83 spans 4980..5040, row 96 spans 5760..5820.
        assert_eq!(window.visible, 83..97);
        assert_eq!(window.render, 83..97);
    }

    #[test]
    fn overscan_extends_and_clamps() {
        let heights = RowHeights::with_uniform(10, 60);
        let window = resolve(0, 120, &heights, 5);
        assert_eq!(window.visible, 0..2);
        assert_eq!(window.render, 0..7);

        let window = resolve(480, 120, &heights, 5);
        assert_eq!(window.visible, 8..10);
        assert_eq!(window.render, 3..10);
    }

    #[test]
    fn empty_and_degenerate_viewports() {
        let heights = RowHeights::with_uniform(10, 60);
        assert!(resolve(0, 0, &heights, 5).is_empty());
        assert!(resolve(0, -40, &heights, 5).is_empty());
        assert!(resolve(0, 800, &RowHeights::new(), 5).is_empty());
    }

    #[test]
    fn tall_row_is_returned_alone() {
        let mut heights = RowHeights::with_uniform(3, 60);
        heights.set_row_height(1, 2_000);
        let window = resolve(500, 800, &heights, 0);
        assert_eq!(window.visible, 1..2);
    }

    #[test]
    fn offset_past_content_clamps_to_last_row() {
        let heights = RowHeights::with_uniform(5, 60);
        let window = resolve(10_000, 400, &heights, 1);
        assert_eq!(window.visible, 4..5);
        assert_eq!(window.render, 3..5);
    }

    #[test]
    fn variable_heights() {
        let mut heights = RowHeights::with_uniform(6, 60);
        heights.set_row_height(2, 556);
        // Offsets: 0, 60, 120, 676, 736, 796.
        let window = ViewportState::new(100, 600, 0).resolve(&heights);
        assert_eq!(window.visible, 1..4);
    }

    #[test]
    fn max_scroll() {
        assert_eq!(max_scroll_offset(1_000, 800), 200);
        assert_eq!(max_scroll_offset(500, 800), 0);
        assert_eq!(max_scroll_offset(500, -1), 500);
    }
}
