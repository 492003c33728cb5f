#![forbid(unsafe_code)]

//! The grouped list engine.
//!
//! [`GroupedList`] owns every piece of state behind the day-accordion list:
//! the grouped records, the metrics cache, per-row heights, the open set, the
//! viewport and a [`FrameScheduler`] for deferred work. The host drives it
//! with three kinds of input:
//!
//! - data: [`set_records`](GroupedList::set_records)
//! - interaction: [`toggle`](GroupedList::toggle),
//!   [`set_scroll_offset`](GroupedList::set_scroll_offset),
//!   [`scroll_to_index`](GroupedList::scroll_to_index),
//!   [`measure_row`](GroupedList::measure_row)
//! - time: [`tick`](GroupedList::tick), once per display frame
//!
//! and reads back [`ListEvent`]s plus the rows to draw via
//! [`render`](GroupedList::render).
//!
//! # Deferred work
//!
//! Nothing expensive runs inside an input call. Height initialization is
//! chunked across frames, an accordion's new height lands two frames after
//! the toggle (so the host can lay out the expanded content first), and
//! corrective scrolling is tweened. Each step is a scheduled task tagged
//! with the engine generation; replacing the records or tearing down cancels
//! every task, and a task from an older generation is dropped unrun.
//!
//! # Height policy
//!
//! A change in group count resets every height to `default_row_height` and
//! recomputes them batch by batch. A regroup that keeps the count reuses the
//! current heights as placeholders while the same batched pass refreshes
//! them.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use daylog_core::easing::ScrollTween;
use daylog_core::{FrameScheduler, ListConfig, TaskHandle};

use crate::accordion::{Accordion, AccordionLayout, AccordionState};
use crate::grouping::{Group, group_records};
use crate::heights::RowHeights;
use crate::metrics_cache::{CacheStats, GroupSummary, MetricsCache};
use crate::record::{DayKey, Record};
use crate::windowing::{ViewportState, Window, max_scroll_offset};

/// Frames between a toggle and the height apply.
const TOGGLE_APPLY_DELAY: u32 = 2;

/// Notifications for the host, drained with [`GroupedList::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// The render range (visible rows plus overscan) changed.
    VisibleRangeChanged { start: usize, end: usize },
    /// The engine moved the scroll position. `smooth` marks tween steps.
    ScrollTo { offset: u32, smooth: bool },
    /// A batched height pass finished.
    HeightsReady { rows: usize },
}

/// Where a row sits in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPlacement {
    pub top: u32,
    pub height: u32,
}

/// Everything a renderer gets for one row.
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub index: usize,
    pub placement: RowPlacement,
    pub group: &'a Group,
    pub summary: &'a GroupSummary,
    pub state: AccordionState,
}

/// Draws one row. Implemented for any `FnMut(RowContext<'_>)`.
pub trait RowRenderer {
    fn render_row(&mut self, row: RowContext<'_>);
}

impl<F> RowRenderer for F
where
    F: FnMut(RowContext<'_>),
{
    fn render_row(&mut self, row: RowContext<'_>) {
        self(row);
    }
}

/// Counters for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListStats {
    /// Times the records were regrouped.
    pub regroups: u64,
    /// Regroups that changed the group count and reset every height.
    pub full_rebuilds: u64,
    /// Batched passes that kept existing heights as placeholders.
    pub refreshes: u64,
    pub toggles: u64,
    /// Deferred height applies that changed a row.
    pub heights_applied: u64,
    /// Tasks cancelled before firing.
    pub cancelled_tasks: u64,
}

#[derive(Debug, Clone, Copy)]
enum ListTask {
    InitBatch { generation: u64 },
    ApplyHeight { generation: u64, key: DayKey, state: AccordionState },
    ScrollStep { generation: u64 },
}

impl ListTask {
    fn generation(&self) -> u64 {
        match *self {
            Self::InitBatch { generation }
            | Self::ApplyHeight { generation, .. }
            | Self::ScrollStep { generation } => generation,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveScroll {
    tween: ScrollTween,
    task: TaskHandle,
}

type MeasuredHeights = HashMap<(DayKey, AccordionState), u32>;

/// Height a group should have in `state`: the host's measurement for that
/// state if one exists, else the layout formula.
fn row_target_height(
    layout: &AccordionLayout,
    measured: &MeasuredHeights,
    group: &Group,
    state: AccordionState,
    selection_mode: bool,
) -> u32 {
    measured
        .get(&(group.key(), state))
        .copied()
        .unwrap_or_else(|| layout.height(group.len(), state, selection_mode))
}

/// Virtualized list of day accordions.
#[derive(Debug)]
pub struct GroupedList {
    config: ListConfig,
    layout: AccordionLayout,
    records: Option<Arc<[Record]>>,
    groups: Vec<Group>,
    index_by_key: HashMap<DayKey, usize>,
    metrics: MetricsCache,
    heights: RowHeights,
    accordion: Accordion,
    measured: MeasuredHeights,
    viewport: ViewportState,
    window: Window,
    scheduler: FrameScheduler<ListTask>,
    scroll: Option<ActiveScroll>,
    generation: u64,
    heights_ready: bool,
    events: Vec<ListEvent>,
    stats: ListStats,
    torn_down: bool,
}

impl Default for GroupedList {
    fn default() -> Self {
        Self::new(ListConfig::default())
    }
}

impl GroupedList {
    /// An empty list. Nothing is drawn until records and a viewport arrive.
    #[must_use]
    pub fn new(config: ListConfig) -> Self {
        Self {
            layout: AccordionLayout::from_config(&config),
            metrics: MetricsCache::new(config.metrics_cache_capacity),
            viewport: ViewportState::new(0, 0, config.effective_overscan()),
            config,
            records: None,
            groups: Vec::new(),
            index_by_key: HashMap::new(),
            heights: RowHeights::new(),
            accordion: Accordion::new(),
            measured: HashMap::new(),
            window: Window::empty(),
            scheduler: FrameScheduler::new(),
            scroll: None,
            generation: 0,
            heights_ready: true,
            events: Vec::new(),
            stats: ListStats::default(),
            torn_down: false,
        }
    }

    /// Build from `DAYLOG_*` environment variables. Parse and validation
    /// errors are logged, not returned.
    #[must_use]
    pub fn from_env() -> Self {
        let parsed = ListConfig::from_env_with_diagnostics();
        if !parsed.errors.is_empty() {
            daylog_core::warn!(errors = ?parsed.errors, "list config from environment has problems");
        }
        daylog_core::debug!(config = %parsed.config.summary_short(), "list config loaded");
        Self::new(parsed.config)
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    /// Replace the record collection.
    ///
    /// Passing the same `Arc` again is a no-op and returns `false`. Any other
    /// collection is regrouped, every pending task is cancelled, and a
    /// batched height pass starts on the next tick.
    pub fn set_records(&mut self, records: Arc<[Record]>) -> bool {
        if self.torn_down {
            return false;
        }
        if let Some(current) = &self.records
            && Arc::ptr_eq(current, &records)
        {
            return false;
        }
        let _span = daylog_core::debug_span!("set_records", records = records.len()).entered();

        let previous_len = self.records.as_ref().map_or(0, |r| r.len());
        if previous_len != records.len() {
            self.metrics.clear();
        }

        let previous_groups = self.groups.len();
        self.groups = group_records(&records);
        self.index_by_key = self
            .groups
            .iter()
            .enumerate()
            .map(|(index, group)| (group.key(), index))
            .collect();
        self.records = Some(records);
        self.measured.clear();
        self.stats.regroups += 1;
        self.generation += 1;

        let cancelled = self.cancel_tasks();
        if cancelled > 0 {
            daylog_core::debug!(cancelled, "cancelled tasks from previous records");
        }

        let rows = self.groups.len();
        let batch = self.config.effective_batch_size();
        if rows != previous_groups || self.heights.len() != rows {
            self.heights.init_batch(rows, self.config.default_row_height, batch);
            self.stats.full_rebuilds += 1;
            daylog_core::debug!(previous_groups, rows, batch, "row count changed, rebuilding heights");
        } else {
            self.heights.begin_init(batch);
            self.stats.refreshes += 1;
            daylog_core::trace!(rows, batch, "refreshing heights");
        }
        self.schedule_init();
        self.refresh_window();
        true
    }

    /// Change the daily goal. Cached metrics are dropped since every goal
    /// status depends on it.
    pub fn set_daily_goal(&mut self, goal: Option<f64>) {
        if self.config.daily_goal == goal {
            return;
        }
        self.config.daily_goal = goal;
        self.metrics.clear();
    }

    /// Toggle selection mode, which changes the height of every open group.
    pub fn set_selection_mode(&mut self, enabled: bool) {
        if self.torn_down || self.config.selection_mode == enabled {
            return;
        }
        self.config.selection_mode = enabled;
        self.scheduler
            .cancel_where(|task| matches!(task, ListTask::InitBatch { .. }));
        self.heights.begin_init(self.config.effective_batch_size());
        self.stats.refreshes += 1;
        self.schedule_init();
    }

    fn schedule_init(&mut self) {
        if self.heights.is_initializing() {
            self.heights_ready = false;
            let generation = self.generation;
            self.scheduler.schedule(ListTask::InitBatch { generation });
        } else {
            self.heights_ready = true;
        }
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Expand or collapse the day `key`.
    ///
    /// The open state flips immediately; the row height follows two ticks
    /// later. Toggling again before then supersedes the pending apply.
    /// Returns `false` for a day not in the list.
    pub fn toggle(&mut self, key: &DayKey) -> bool {
        if self.torn_down || !self.index_by_key.contains_key(key) {
            return false;
        }
        let state = self.accordion.toggle(*key);
        let task = ListTask::ApplyHeight {
            generation: self.generation,
            key: *key,
            state,
        };
        let handle = self.scheduler.schedule_after(TOGGLE_APPLY_DELAY, task);
        if let Some(previous) = self.accordion.replace_pending(*key, handle)
            && self.scheduler.cancel(previous)
        {
            daylog_core::trace!(day = %key, "superseded pending height apply");
        }
        self.stats.toggles += 1;
        daylog_core::debug!(day = %key, ?state, "accordion toggled");
        true
    }

    /// Record a host-measured height for row `index` in its current state.
    ///
    /// The measurement overrides the layout formula for that day and state
    /// until the records are replaced. Returns `false` for an unknown row.
    pub fn measure_row(&mut self, index: usize, height: u32) -> bool {
        if self.torn_down {
            return false;
        }
        let Some(group) = self.groups.get(index) else {
            return false;
        };
        let key = group.key();
        let state = self.accordion.state(&key);
        self.measured.insert((key, state), height);
        self.heights.set_row_height(index, height);
        self.refresh_window();
        true
    }

    /// Host-reported scroll position. Cancels any smooth scroll in flight.
    pub fn set_scroll_offset(&mut self, offset: u32) {
        self.cancel_smooth_scroll();
        self.viewport.scroll_offset = offset;
        self.refresh_window();
    }

    /// Host-reported viewport height in pixels.
    pub fn set_viewport_height(&mut self, height: i32) {
        self.viewport.viewport_height = height;
        self.refresh_window();
    }

    /// Set scroll position and viewport height together.
    pub fn set_viewport(&mut self, scroll_offset: u32, height: i32) {
        self.cancel_smooth_scroll();
        self.viewport.scroll_offset = scroll_offset;
        self.viewport.viewport_height = height;
        self.refresh_window();
    }

    /// Jump so row `index` sits at the top of the viewport (as far as the
    /// scroll range allows). Returns `false` for an unknown row.
    pub fn scroll_to_index(&mut self, index: usize) -> bool {
        if self.torn_down || index >= self.heights.len() {
            return false;
        }
        self.cancel_smooth_scroll();
        let offset = self.heights.cumulative_offset(index).min(self.max_scroll());
        self.viewport.scroll_offset = offset;
        self.events.push(ListEvent::ScrollTo { offset, smooth: false });
        self.refresh_window();
        true
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Advance one frame and run the tasks that became due. Returns how many
    /// ran.
    pub fn tick(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        let due = self.scheduler.advance();
        let mut ran = 0;
        for task in due {
            if task.generation() != self.generation {
                daylog_core::trace!(task = ?task, "skipped task from an older generation");
                continue;
            }
            ran += 1;
            match task {
                ListTask::InitBatch { .. } => self.run_init_batch(),
                ListTask::ApplyHeight { key, state, .. } => self.apply_height(key, state),
                ListTask::ScrollStep { .. } => self.run_scroll_step(),
            }
        }
        if ran > 0 {
            self.refresh_window();
        }
        ran
    }

    /// Tick until no task is pending, at most `max_ticks` times. Returns the
    /// number of ticks taken.
    pub fn settle(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && !self.scheduler.is_idle() && !self.torn_down {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// Cancel all deferred work. Later ticks and inputs are no-ops.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let cancelled = self.cancel_tasks();
        let interrupted_init = self.heights.cancel_init();
        self.torn_down = true;
        if cancelled > 0 || interrupted_init {
            daylog_core::debug!(cancelled, interrupted_init, "grouped list torn down with work pending");
        }
    }

    fn run_init_batch(&mut self) {
        let layout = self.layout;
        let selection_mode = self.config.selection_mode;
        let fallback = self.config.default_row_height;
        let groups = &self.groups;
        let accordion = &self.accordion;
        let measured = &self.measured;
        let progress = self.heights.init_step(|index| match groups.get(index) {
            Some(group) => {
                let state = accordion.state(&group.key());
                row_target_height(&layout, measured, group, state, selection_mode)
            }
            None => fallback,
        });
        daylog_core::trace!(assigned = ?progress.assigned, done = progress.done, "height batch");

        if progress.done {
            self.heights_ready = true;
            let rows = self.heights.len();
            self.events.push(ListEvent::HeightsReady { rows });
            daylog_core::debug!(rows, total = self.heights.total_height(), "heights ready");
        } else {
            let generation = self.generation;
            self.scheduler.schedule(ListTask::InitBatch { generation });
        }
    }

    fn apply_height(&mut self, key: DayKey, state: AccordionState) {
        self.accordion.complete(&key);
        let Some(&index) = self.index_by_key.get(&key) else {
            return;
        };
        let Some(group) = self.groups.get(index) else {
            return;
        };
        let height = row_target_height(
            &self.layout,
            &self.measured,
            group,
            state,
            self.config.selection_mode,
        );
        if self.heights.set_row_height(index, height) {
            self.stats.heights_applied += 1;
        }
        if state.is_open() {
            self.ensure_visible(index);
        }
    }

    /// Start a smooth scroll if row `index` is not fully inside the viewport,
    /// leaving `scroll_margin` pixels above it.
    fn ensure_visible(&mut self, index: usize) {
        let Some(height) = self.heights.row_height(index) else {
            return;
        };
        let top = self.heights.cumulative_offset(index);
        let bottom = top.saturating_add(height);
        let scroll = self.viewport.scroll_offset;
        let viewport = u32::try_from(self.viewport.viewport_height).unwrap_or(0);
        if top >= scroll && bottom <= scroll.saturating_add(viewport) {
            return;
        }
        let target = top
            .saturating_sub(self.config.scroll_margin)
            .min(self.max_scroll());
        if target != scroll {
            self.start_smooth_scroll(target);
        }
    }

    fn start_smooth_scroll(&mut self, target: u32) {
        self.cancel_smooth_scroll();
        let from = self.viewport.scroll_offset;
        let tween = ScrollTween::new(from, target, self.config.smooth_scroll_frames);
        let generation = self.generation;
        let task = self.scheduler.schedule(ListTask::ScrollStep { generation });
        self.scroll = Some(ActiveScroll { tween, task });
        daylog_core::debug!(from, target, "smooth scroll started");
    }

    fn run_scroll_step(&mut self) {
        let Some(mut active) = self.scroll.take() else {
            return;
        };
        // Content may have shrunk since the scroll started.
        let max = self.max_scroll();
        let stepped = active.tween.step();
        let offset = stepped.min(max);
        self.viewport.scroll_offset = offset;
        self.events.push(ListEvent::ScrollTo { offset, smooth: true });
        if offset < stepped && active.tween.target() >= max {
            daylog_core::debug!(target = active.tween.target(), offset, "smooth scroll cut short at scroll range");
        } else if !active.tween.is_complete() {
            let generation = self.generation;
            active.task = self.scheduler.schedule(ListTask::ScrollStep { generation });
            self.scroll = Some(active);
        }
    }

    fn cancel_smooth_scroll(&mut self) {
        if let Some(active) = self.scroll.take() {
            self.scheduler.cancel(active.task);
        }
    }

    /// Drop every scheduled task and the bookkeeping pointing at them.
    fn cancel_tasks(&mut self) -> usize {
        let cancelled = self.scheduler.cancel_all();
        self.accordion.clear_pending();
        self.scroll = None;
        cancelled
    }

    fn max_scroll(&self) -> u32 {
        max_scroll_offset(self.heights.total_height(), self.viewport.viewport_height)
    }

    fn refresh_window(&mut self) {
        let window = self.viewport.resolve(&self.heights);
        if window.render != self.window.render {
            self.events.push(ListEvent::VisibleRangeChanged {
                start: window.render.start,
                end: window.render.end,
            });
        }
        self.window = window;
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Hand every row in the render range to `renderer`, top to bottom.
    /// Returns the number of rows drawn.
    pub fn render<R>(&mut self, renderer: &mut R) -> usize
    where
        R: RowRenderer + ?Sized,
    {
        let goal = self.config.daily_goal;
        let mut drawn = 0;
        for index in self.window.render.clone() {
            let Some(group) = self.groups.get(index) else {
                break;
            };
            let placement = RowPlacement {
                top: self.heights.cumulative_offset(index),
                height: self.heights.row_height(index).unwrap_or(0),
            };
            let state = self.accordion.state(&group.key());
            let summary = self.metrics.get_or_compute(group.records(), goal);
            renderer.render_row(RowContext {
                index,
                placement,
                group,
                summary,
                state,
            });
            drawn += 1;
        }
        drawn
    }

    /// Take the events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<ListEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn index_of(&self, key: &DayKey) -> Option<usize> {
        self.index_by_key.get(key).copied()
    }

    #[must_use]
    pub fn is_open(&self, key: &DayKey) -> bool {
        self.accordion.is_open(key)
    }

    #[must_use]
    pub fn row_height(&self, index: usize) -> Option<u32> {
        self.heights.row_height(index)
    }

    #[must_use]
    pub fn cumulative_offset(&self, index: usize) -> u32 {
        self.heights.cumulative_offset(index)
    }

    #[must_use]
    pub fn total_height(&self) -> u32 {
        self.heights.total_height()
    }

    #[must_use]
    pub fn heights(&self) -> &RowHeights {
        &self.heights
    }

    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    #[must_use]
    pub fn visible_range(&self) -> Range<usize> {
        self.window.visible.clone()
    }

    #[must_use]
    pub fn render_range(&self) -> Range<usize> {
        self.window.render.clone()
    }

    #[must_use]
    pub fn scroll_offset(&self) -> u32 {
        self.viewport.scroll_offset
    }

    #[must_use]
    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    /// No batched height pass is pending.
    #[must_use]
    pub fn heights_ready(&self) -> bool {
        self.heights_ready
    }

    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.scroll.is_some()
    }

    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    #[must_use]
    pub fn stats(&self) -> ListStats {
        ListStats {
            cancelled_tasks: self.scheduler.cancelled_total(),
            ..self.stats
        }
    }

    #[must_use]
    pub fn metrics_stats(&self) -> CacheStats {
        self.metrics.stats()
    }
}
