#![forbid(unsafe_code)]

//! Day grouping and per-day aggregate metrics.
//!
//! Everything here is a pure function of its inputs. Caching lives in
//! [`crate::metrics_cache`]; the engine decides when to regroup.
//!
//! # Break rules
//!
//! A break is the gap `next.start - prev.end` between two chronologically
//! adjacent records of the same day. Gaps that are negative (overlap or bad
//! ordering), zero (back-to-back), or longer than [`MAX_BREAK_MINUTES`] are not
//! breaks.

use std::collections::BTreeMap;

use crate::record::{DayKey, Record};

/// Upper bound for a gap to count as a break.
pub const MAX_BREAK_MINUTES: u32 = 12 * 60;

/// All records sharing one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    key: DayKey,
    records: Vec<Record>,
}

impl Group {
    #[must_use]
    pub fn key(&self) -> DayKey {
        self.key
    }

    /// Records in input order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Group records by day, newest day first.
///
/// Records without a parseable `date` are dropped.
#[must_use]
pub fn group_records(records: &[Record]) -> Vec<Group> {
    let mut by_day: BTreeMap<DayKey, Vec<Record>> = BTreeMap::new();
    let mut dropped = 0usize;
    for record in records {
        match record.day_key() {
            Some(key) => by_day.entry(key).or_default().push(record.clone()),
            None => {
                dropped += 1;
                daylog_core::trace!(id = %record.id, date = ?record.date, "dropping record without a valid date");
            }
        }
    }
    if dropped > 0 {
        daylog_core::debug!(dropped, kept = records.len() - dropped, "malformed records skipped");
    }
    by_day
        .into_iter()
        .rev()
        .map(|(key, records)| Group { key, records })
        .collect()
}

/// How a day's earnings compare to the daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalLevel {
    /// At least 100% of the goal.
    Success,
    /// 50% to 99%.
    Warning,
    /// Below 50%.
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalStatus {
    pub level: GoalLevel,
    /// Rounded percentage of the goal reached.
    pub percent: u32,
}

/// Classify `earned` against `goal`. `None` when no positive goal is set.
#[must_use]
pub fn goal_status(earned: f64, goal: Option<f64>) -> Option<GoalStatus> {
    let goal = goal.filter(|g| g.is_finite() && *g > 0.0)?;
    let percent = (earned / goal * 100.0).round().max(0.0) as u32;
    let level = match percent {
        p if p >= 100 => GoalLevel::Success,
        p if p >= 50 => GoalLevel::Warning,
        _ => GoalLevel::Danger,
    };
    Some(GoalStatus { level, percent })
}

/// Aggregates for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayMetrics {
    pub total_hours: f64,
    pub total_earned: f64,
    /// `total_earned / total_hours`, zero when no hours were worked.
    pub average_rate: f64,
    pub longest_session_hours: f64,
    pub total_break_minutes: u32,
    pub longest_break_minutes: u32,
    pub status: Option<GoalStatus>,
}

impl DayMetrics {
    #[must_use]
    pub fn empty(goal: Option<f64>) -> Self {
        Self {
            total_hours: 0.0,
            total_earned: 0.0,
            average_rate: 0.0,
            longest_session_hours: 0.0,
            total_break_minutes: 0,
            longest_break_minutes: 0,
            status: goal_status(0.0, goal),
        }
    }
}

/// Gap between `prev` ending and `next` starting, if it counts as a break.
#[must_use]
pub fn break_minutes(prev: &Record, next: &Record) -> Option<u32> {
    let end = prev.end_minutes()?;
    let start = next.start_minutes()?;
    let gap = i64::from(start) - i64::from(end);
    if gap <= 0 || gap > i64::from(MAX_BREAK_MINUTES) {
        return None;
    }
    Some(gap as u32)
}

/// Record indices sorted by start time, earliest first. Records without a
/// start sort last, keeping input order among themselves.
#[must_use]
pub fn chronological_order(records: &[Record]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| {
        let start = records[i].start_minutes();
        (start.is_none(), start)
    });
    order
}

/// Record indices sorted by start time, latest first. Records without a
/// start sort last.
#[must_use]
pub fn display_order(records: &[Record]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| {
        let start = records[i].start_minutes();
        (start.is_none(), std::cmp::Reverse(start))
    });
    order
}

/// Break following each record (indexed like `records`), given the
/// chronological order from [`chronological_order`].
#[must_use]
pub fn breaks_after(records: &[Record], chronological: &[usize]) -> Vec<Option<u32>> {
    let mut breaks = vec![None; records.len()];
    for pair in chronological.windows(2) {
        breaks[pair[0]] = break_minutes(&records[pair[0]], &records[pair[1]]);
    }
    breaks
}

/// Compute all metrics for one day's records.
#[must_use]
pub fn day_metrics(records: &[Record], goal: Option<f64>) -> DayMetrics {
    if records.is_empty() {
        return DayMetrics::empty(goal);
    }

    let mut total_hours = 0.0;
    let mut total_earned = 0.0;
    let mut longest_session_hours: f64 = 0.0;
    for record in records {
        let hours = record.duration_hours();
        total_hours += hours;
        total_earned += record.earned_amount();
        longest_session_hours = longest_session_hours.max(hours);
    }

    let chronological = chronological_order(records);
    let breaks = breaks_after(records, &chronological);
    let total_break_minutes: u32 = breaks.iter().flatten().sum();
    let longest_break_minutes = breaks.iter().flatten().copied().max().unwrap_or(0);

    let average_rate = if total_hours > 0.0 {
        total_earned / total_hours
    } else {
        0.0
    };

    DayMetrics {
        total_hours,
        total_earned,
        average_rate,
        longest_session_hours,
        total_break_minutes,
        longest_break_minutes,
        status: goal_status(total_earned, goal),
    }
}
