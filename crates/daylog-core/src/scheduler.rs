#![forbid(unsafe_code)]

//! Cooperative, cancelable frame-callback scheduler.
//!
//! Deferred work is represented as plain task values queued against a future
//! frame number. The host drives the clock by calling [`FrameScheduler::advance`]
//! once per rendered frame and executes the returned tasks itself. Nothing here
//! owns closures, so the engine can match on its own task enum with full access
//! to its state and tests can drive frames deterministically.
//!
//! # Invariants
//!
//! 1. A task scheduled `n` frames ahead is returned by exactly the `n`-th
//!    subsequent `advance()` call, unless cancelled first.
//! 2. Tasks due on the same frame are returned in scheduling order.
//! 3. A cancelled handle never fires; cancelling twice returns `false`.
//! 4. Tasks scheduled while processing frame `f` are due no earlier than `f + 1`.
//!
//! # Failure Modes
//!
//! - `schedule_after(0, ..)`: treated as one frame; nothing runs synchronously.
//! - Handle from a cleared scheduler: `cancel` and `is_pending` return `false`.

/// Opaque identifier for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    /// Raw id, useful only for logging.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Scheduled<T> {
    handle: TaskHandle,
    due: u64,
    task: T,
}

/// Frame-based task queue.
#[derive(Debug, Clone)]
pub struct FrameScheduler<T> {
    frame: u64,
    next_id: u64,
    /// Sorted by `(due, handle)`.
    queue: Vec<Scheduled<T>>,
    cancelled: u64,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameScheduler<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame: 0,
            next_id: 0,
            queue: Vec::new(),
            cancelled: 0,
        }
    }

    /// Number of frames advanced so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of tasks waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total tasks cancelled over the scheduler's lifetime.
    #[must_use]
    pub fn cancelled_total(&self) -> u64 {
        self.cancelled
    }

    /// Run `task` on the next frame.
    pub fn schedule(&mut self, task: T) -> TaskHandle {
        self.schedule_after(1, task)
    }

    /// Run `task` after `frames` frame boundaries (minimum one).
    pub fn schedule_after(&mut self, frames: u32, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        let due = self.frame + u64::from(frames.max(1));
        // Handles are monotonic, so the insertion point after all entries with
        // `due <= new due` keeps the (due, handle) order.
        let at = self.queue.partition_point(|s| s.due <= due);
        self.queue.insert(at, Scheduled { handle, due, task });
        handle
    }

    /// Whether `handle` is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.queue.iter().any(|s| s.handle == handle)
    }

    /// Cancel a single task. Returns `true` if it was pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.queue.iter().position(|s| s.handle == handle) {
            Some(pos) => {
                self.queue.remove(pos);
                self.cancelled += 1;
                true
            }
            None => false,
        }
    }

    /// Cancel every pending task matching `pred`. Returns how many were removed.
    pub fn cancel_where<P>(&mut self, mut pred: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        let before = self.queue.len();
        self.queue.retain(|s| !pred(&s.task));
        let removed = before - self.queue.len();
        self.cancelled += removed as u64;
        removed
    }

    /// Cancel everything. Returns how many tasks were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let removed = self.queue.len();
        self.queue.clear();
        self.cancelled += removed as u64;
        removed
    }

    /// Cross one frame boundary and return the tasks that became due, in order.
    pub fn advance(&mut self) -> Vec<T> {
        self.frame += 1;
        let frame = self.frame;
        let split = self.queue.partition_point(|s| s.due <= frame);
        self.queue.drain(..split).map(|s| s.task).collect()
    }

    /// Frames until the earliest pending task fires, if any.
    #[must_use]
    pub fn frames_until_next(&self) -> Option<u64> {
        self.queue
            .first()
            .map(|s| s.due.saturating_sub(self.frame))
    }
}
