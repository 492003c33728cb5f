#![forbid(unsafe_code)]

//! Per-row pixel heights with O(log n) offset queries.
//!
//! [`RowHeights`] is the authoritative height store for the grouped list: one
//! entry per day group, backed by a [`FenwickTree`] so that patching a single
//! row (an accordion toggle) and asking "where does row `i` start" are both
//! logarithmic.
//!
//! # Batched initialization
//!
//! Computing real heights for thousands of groups in one frame would stall
//! the UI thread. Instead the store is [`reset`](RowHeights::reset) to a
//! uniform default and then filled in chunks: [`begin_init`](RowHeights::begin_init)
//! arms a cursor and every [`init_step`](RowHeights::init_step) assigns the
//! next `batch_size` rows in increasing index order. A collection of `n` rows
//! finishes in exactly `ceil(n / batch_size)` steps.
//!
//! # Invariants
//!
//! 1. `heights.len() == tree.len()` at all times.
//! 2. `cumulative_offset(i) == heights[0..i].sum()` after every mutation.
//! 3. Rows never assigned by an init step keep the default height.
//! 4. `total_height() <= u32::MAX`: a height that would push the total past
//!    it is clamped to the room left.

use std::ops::Range;

use crate::fenwick::FenwickTree;

/// Result of one [`RowHeights::init_step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitProgress {
    /// Rows assigned by this step.
    pub assigned: Range<usize>,
    /// No rows remain after this step.
    pub done: bool,
}

#[derive(Debug, Clone, Copy)]
struct InitCursor {
    next: usize,
    batch_size: usize,
}

/// Height store for a list of variable-height rows.
#[derive(Debug, Clone, Default)]
pub struct RowHeights {
    heights: Vec<u32>,
    tree: FenwickTree,
    default_height: u32,
    init: Option<InitCursor>,
}

impl RowHeights {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store of `row_count` rows at `default_height`, fully initialized.
    #[must_use]
    pub fn with_uniform(row_count: usize, default_height: u32) -> Self {
        let mut heights = Self::new();
        heights.reset(row_count, default_height);
        heights
    }

    /// Drop every height and start over with `row_count` rows at
    /// `default_height`. Cancels any init in progress.
    pub fn reset(&mut self, row_count: usize, default_height: u32) {
        let per_row = u32::try_from(row_count).map_or(0, |rows| u32::MAX / rows.max(1));
        let default_height = default_height.min(per_row);
        self.default_height = default_height;
        self.heights.clear();
        self.heights.resize(row_count, default_height);
        self.tree.rebuild(&self.heights);
        self.init = None;
    }

    /// [`reset`](Self::reset) followed by [`begin_init`](Self::begin_init).
    /// Returns the number of steps needed to finish.
    pub fn init_batch(&mut self, row_count: usize, default_height: u32, batch_size: usize) -> usize {
        self.reset(row_count, default_height);
        self.begin_init(batch_size)
    }

    /// Arm a chunked pass over every row, keeping current heights until each
    /// chunk is assigned. Returns `ceil(len / batch_size)`, the number of
    /// [`init_step`](Self::init_step) calls until completion (zero when empty).
    pub fn begin_init(&mut self, batch_size: usize) -> usize {
        let batch_size = batch_size.max(1);
        if self.heights.is_empty() {
            self.init = None;
            return 0;
        }
        self.init = Some(InitCursor {
            next: 0,
            batch_size,
        });
        self.heights.len().div_ceil(batch_size)
    }

    /// Assign the next chunk of rows using `compute(index)`.
    ///
    /// Without an armed init this assigns nothing and reports `done`.
    pub fn init_step<F>(&mut self, mut compute: F) -> InitProgress
    where
        F: FnMut(usize) -> u32,
    {
        let len = self.heights.len();
        let Some(cursor) = self.init else {
            return InitProgress {
                assigned: len..len,
                done: true,
            };
        };

        let start = cursor.next.min(len);
        let end = start.saturating_add(cursor.batch_size).min(len);
        for index in start..end {
            self.set_row_height(index, compute(index));
        }

        let done = end >= len;
        self.init = if done {
            None
        } else {
            Some(InitCursor { next: end, ..cursor })
        };
        InitProgress {
            assigned: start..end,
            done,
        }
    }

    /// Abandon an init in progress. Rows not yet assigned keep their height.
    /// Returns `true` if an init was running.
    pub fn cancel_init(&mut self) -> bool {
        self.init.take().is_some()
    }

    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.init.is_some()
    }

    /// Rows assigned by the current init pass, or `len()` when none is running.
    #[must_use]
    pub fn initialized_rows(&self) -> usize {
        self.init.map_or(self.heights.len(), |c| c.next)
    }

    /// Set row `index` to `height`.
    ///
    /// Returns `true` if the stored height changed. Repeating a call, or
    /// passing an index past the end, leaves every offset untouched. The
    /// height is clamped so the total stays within `u32`.
    pub fn set_row_height(&mut self, index: usize, height: u32) -> bool {
        let Some(&old) = self.heights.get(index) else {
            return false;
        };
        let room = u32::MAX - (self.tree.total() - old);
        let height = height.min(room);
        if old == height {
            return false;
        }
        self.heights[index] = height;
        self.tree.replace(index, old, height);
        true
    }

    #[must_use]
    pub fn row_height(&self, index: usize) -> Option<u32> {
        self.heights.get(index).copied()
    }

    /// Pixel offset of the top of row `index`. Indices past the end clamp to
    /// [`total_height`](Self::total_height).
    #[must_use]
    pub fn cumulative_offset(&self, index: usize) -> u32 {
        self.tree.sum_before(index)
    }

    #[must_use]
    pub fn total_height(&self) -> u32 {
        self.tree.total()
    }

    /// Row covering pixel `offset`, clamped to the last row. `None` when empty.
    #[must_use]
    pub fn row_at_offset(&self, offset: u32) -> Option<usize> {
        let last = self.heights.len().checked_sub(1)?;
        Some(self.tree.rows_within(offset).min(last))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Height assigned by the last [`reset`](Self::reset).
    #[must_use]
    pub fn default_height(&self) -> u32 {
        self.default_height
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.heights
    }
}
