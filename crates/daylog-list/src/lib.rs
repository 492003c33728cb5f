#![forbid(unsafe_code)]

//! Virtualized list of expandable per-day accordions.
//!
//! Records are grouped by calendar day, each day is one variable-height row,
//! and only the rows intersecting the viewport are handed to the renderer.
//! [`GroupedList`] is the entry point; the other modules are its building
//! blocks and are public for hosts that want to compose them differently.

pub mod accordion;
pub mod fenwick;
pub mod grouping;
pub mod heights;
pub mod list;
pub mod metrics_cache;
pub mod record;
pub mod windowing;

pub use accordion::{Accordion, AccordionLayout, AccordionState};
pub use fenwick::FenwickTree;
pub use grouping::{DayMetrics, GoalLevel, GoalStatus, Group, day_metrics, group_records};
pub use heights::{InitProgress, RowHeights};
pub use list::{GroupedList, ListEvent, ListStats, RowContext, RowPlacement, RowRenderer};
pub use metrics_cache::{CacheStats, Fingerprint, GroupSummary, MetricsCache};
pub use record::{DayKey, DayKeyError, Record};
pub use windowing::{ViewportState, Window, resolve};

pub use daylog_core::{Density, ListConfig, should_virtualize};
