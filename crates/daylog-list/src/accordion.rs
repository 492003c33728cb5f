#![forbid(unsafe_code)]

//! Open/closed bookkeeping for per-day accordions.
//!
//! [`Accordion`] owns the set of expanded days and, for each day, the handle
//! of the deferred height apply still in flight. It knows nothing about
//! indices or pixels; the engine maps keys to rows and heights.
//!
//! Membership is keyed by [`DayKey`], so a day stays open across regroupings
//! even when its row index moves.

use std::collections::{HashMap, HashSet};

use daylog_core::{ListConfig, TaskHandle};

use crate::record::DayKey;

/// Visual state of one accordion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccordionState {
    #[default]
    Closed,
    Open,
}

impl AccordionState {
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Closed => Self::Open,
            Self::Open => Self::Closed,
        }
    }
}

/// Open set plus pending height applies.
#[derive(Debug, Clone, Default)]
pub struct Accordion {
    open: HashSet<DayKey>,
    pending: HashMap<DayKey, TaskHandle>,
}

impl Accordion {
    /// All days closed, nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `key` and return its new state.
    pub fn toggle(&mut self, key: DayKey) -> AccordionState {
        if self.open.remove(&key) {
            AccordionState::Closed
        } else {
            self.open.insert(key);
            AccordionState::Open
        }
    }

    #[must_use]
    pub fn is_open(&self, key: &DayKey) -> bool {
        self.open.contains(key)
    }

    #[must_use]
    pub fn state(&self, key: &DayKey) -> AccordionState {
        if self.is_open(key) {
            AccordionState::Open
        } else {
            AccordionState::Closed
        }
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Record `handle` as the pending apply for `key`, returning the one it
    /// supersedes (which the caller must cancel).
    pub fn replace_pending(&mut self, key: DayKey, handle: TaskHandle) -> Option<TaskHandle> {
        self.pending.insert(key, handle)
    }

    /// Mark the pending apply for `key` as fired, returning its handle.
    pub fn complete(&mut self, key: &DayKey) -> Option<TaskHandle> {
        self.pending.remove(key)
    }

    #[must_use]
    pub fn pending_for(&self, key: &DayKey) -> Option<TaskHandle> {
        self.pending.get(key).copied()
    }

    /// Forget every pending apply, returning their handles.
    pub fn clear_pending(&mut self) -> Vec<TaskHandle> {
        self.pending.drain().map(|(_, handle)| handle).collect()
    }
}

/// Pixel geometry of one accordion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccordionLayout {
    pub header_height: u32,
    pub table_header_height: u32,
    pub record_row_height: u32,
    pub table_padding: u32,
}

impl Default for AccordionLayout {
    fn default() -> Self {
        Self::from_config(&ListConfig::default())
    }
}

impl AccordionLayout {
    #[must_use]
    pub fn from_config(config: &ListConfig) -> Self {
        Self {
            header_height: config.header_height,
            table_header_height: config.table_header_height,
            record_row_height: config.record_row_height,
            table_padding: config.table_padding,
        }
    }

    /// Height of a day with `record_count` records in `state`.
    ///
    /// Closed is just the header. Open adds the table header (selection mode
    /// only), one row per record, and bottom padding.
    #[must_use]
    pub fn height(&self, record_count: usize, state: AccordionState, selection_mode: bool) -> u32 {
        if !state.is_open() {
            return self.header_height;
        }
        let rows = u32::try_from(record_count)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.record_row_height);
        let table_header = if selection_mode {
            self.table_header_height
        } else {
            0
        };
        self.header_height
            .saturating_add(table_header)
            .saturating_add(rows)
            .saturating_add(self.table_padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daylog_core::FrameScheduler;

    fn key(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[test]
    fn toggle_round_trip() {
        let mut acc = Accordion::new();
        let day = key("2024-05-01");
        assert_eq!(acc.state(&day), AccordionState::Closed);
        assert_eq!(acc.toggle(day), AccordionState::Open);
        assert!(acc.is_open(&day));
        assert_eq!(acc.toggle(day), AccordionState::Closed);
        assert_eq!(acc.open_count(), 0);
    }

    #[test]
    fn newer_apply_supersedes_older() {
        let mut sched: FrameScheduler<()> = FrameScheduler::new();
        let mut acc = Accordion::new();
        let day = key("2024-05-01");
        let first = sched.schedule(());
        let second = sched.schedule(());
        assert_eq!(acc.replace_pending(day, first), None);
        assert_eq!(acc.replace_pending(day, second), Some(first));
        assert_eq!(acc.pending_for(&day), Some(second));
        assert_eq!(acc.complete(&day), Some(second));
        assert_eq!(acc.complete(&day), None);
    }

    #[test]
    fn clear_pending_returns_handles() {
        let mut sched: FrameScheduler<()> = FrameScheduler::new();
        let mut acc = Accordion::new();
        acc.replace_pending(key("2024-05-01"), sched.schedule(()));
        acc.replace_pending(key("2024-05-02"), sched.schedule(()));
        assert_eq!(acc.clear_pending().len(), 2);
        assert!(acc.clear_pending().is_empty());
    }

    #[test]
    fn layout_heights() {
        let layout = AccordionLayout::default();
        assert_eq!(layout.height(10, AccordionState::Closed, false), 60);
        assert_eq!(layout.height(10, AccordionState::Open, false), 556);
        assert_eq!(layout.height(10, AccordionState::Open, true), 596);
        assert_eq!(layout.height(0, AccordionState::Open, false), 76);
    }
}
