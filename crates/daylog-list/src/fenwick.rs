#![forbid(unsafe_code)]

//! Fenwick tree (Binary Indexed Tree) over row heights.
//!
//! Maps row index to pixel offset and back in O(log n), so a toggled
//! accordion costs one point update instead of a full prefix-sum rebuild.
//!
//! # Layout
//!
//! Stored 1-indexed in a contiguous `Vec<u32>` of length `n + 1` (slot 0
//! unused). Values are pixel heights; sums use wrapping arithmetic, which is
//! exact as long as the total content height fits in `u32`.
//!
//! # Operations
//!
//! | Operation | Time |
//! |-----------|------|
//! | `from_values(v)` | O(n) |
//! | `replace(i, old, new)` | O(log n) |
//! | `sum_before(i)` | O(log n) |
//! | `rows_within(offset)` | O(log n) |
//! | `rebuild(values)` | O(n) |
//!
//! # Invariants
//!
//! 1. `sum_before(i) == values[0..i].sum()` for every `i` in `0..=n`.
//! 2. `sum_before(n) == total()`.
//! 3. `rows_within(t)` is the largest `k` with `sum_before(k) <= t`.

/// Prefix sums over `u32` row heights.
#[derive(Debug, Clone, Default)]
pub struct FenwickTree {
    /// Partial sums, 1-indexed; `nodes[0]` is never read.
    nodes: Vec<u32>,
    rows: usize,
}

impl FenwickTree {
    /// Tree of `rows` zero-height rows.
    #[must_use]
    pub fn new(rows: usize) -> Self {
        Self {
            nodes: vec![0; rows + 1],
            rows,
        }
    }

    /// Build from row heights in O(n).
    #[must_use]
    pub fn from_values(values: &[u32]) -> Self {
        let mut tree = Self::new(values.len());
        tree.rebuild(values);
        tree
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Replace row `i`'s height `old` with `new`.
    ///
    /// The caller owns the authoritative values and passes the previous one,
    /// which saves a second O(log n) walk to recover it.
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    pub fn replace(&mut self, i: usize, old: u32, new: u32) {
        assert!(i < self.rows, "row {i} out of bounds (rows={})", self.rows);
        let delta = new.wrapping_sub(old);
        if delta == 0 {
            return;
        }
        let mut node = i + 1;
        while node <= self.rows {
            self.nodes[node] = self.nodes[node].wrapping_add(delta);
            node += low_bit(node);
        }
    }

    /// Sum of rows `[0, i)`: the pixel offset of row `i`. `i` is clamped to `len()`.
    #[must_use]
    pub fn sum_before(&self, i: usize) -> u32 {
        let mut node = i.min(self.rows);
        let mut offset = 0u32;
        while node > 0 {
            offset = offset.wrapping_add(self.nodes[node]);
            node -= low_bit(node);
        }
        offset
    }

    /// Total height of all rows.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.sum_before(self.rows)
    }

    /// Largest `k` such that the first `k` rows fit within `offset` pixels.
    ///
    /// For `offset < total()` this is the index of the row covering pixel
    /// `offset` (skipping zero-height rows). Descends the tree instead of
    /// binary searching over `sum_before`, so it stays O(log n).
    #[must_use]
    pub fn rows_within(&self, offset: u32) -> usize {
        let mut counted = 0usize;
        let mut budget = offset;
        let mut span = top_bit(self.rows);
        while span > 0 {
            let node = counted + span;
            if node <= self.rows && self.nodes[node] <= budget {
                budget -= self.nodes[node];
                counted = node;
            }
            span >>= 1;
        }
        counted
    }

    /// Rebuild in O(n) from fresh heights, resizing to `values.len()`.
    pub fn rebuild(&mut self, values: &[u32]) {
        self.rows = values.len();
        self.nodes.clear();
        self.nodes.push(0);
        self.nodes.extend_from_slice(values);
        // Push each node's partial sum into the node that covers it.
        for node in 1..=self.rows {
            let cover = node + low_bit(node);
            if cover <= self.rows {
                let partial = self.nodes[node];
                self.nodes[cover] = self.nodes[cover].wrapping_add(partial);
            }
        }
    }
}

/// Span of node `i`: its lowest set bit (`low_bit(12) == 4`).
#[inline]
fn low_bit(i: usize) -> usize {
    i & i.wrapping_neg()
}

/// Largest power of two not above `rows`, zero for an empty tree.
#[inline]
fn top_bit(rows: usize) -> usize {
    match rows {
        0 => 0,
        _ => 1 << rows.ilog2(),
    }
}
