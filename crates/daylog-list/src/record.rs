#![forbid(unsafe_code)]

//! Time-tracking records and the calendar-day key they are grouped by.
//!
//! Records arrive from an external store exactly as logged, so every field
//! except the id is optional or defaulted. Validation is lazy: accessors parse
//! on demand and return `None` for anything malformed.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// One logged interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// Calendar day, `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    /// Time of day, `HH:MM`.
    #[serde(default)]
    pub start: Option<String>,
    /// Time of day, `HH:MM`. Absent while the interval is still running.
    #[serde(default)]
    pub end: Option<String>,
    /// Explicit duration in hours; wins over `end - start` when positive.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub earned: f64,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl Record {
    #[must_use]
    pub fn new(id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date: Some(date.into()),
            start: None,
            end: None,
            duration: None,
            earned: 0.0,
            category_id: None,
        }
    }

    #[must_use]
    pub fn with_times(mut self, start: &str, end: Option<&str>) -> Self {
        self.start = Some(start.to_string());
        self.end = end.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration = Some(hours);
        self
    }

    #[must_use]
    pub fn with_earned(mut self, earned: f64) -> Self {
        self.earned = earned;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Parsed day key, `None` if the date is missing or malformed.
    #[must_use]
    pub fn day_key(&self) -> Option<DayKey> {
        self.date.as_deref().and_then(|d| d.parse().ok())
    }

    /// Start time as minutes since midnight.
    #[must_use]
    pub fn start_minutes(&self) -> Option<u32> {
        self.start.as_deref().and_then(minutes_of_day)
    }

    /// End time as minutes since midnight.
    #[must_use]
    pub fn end_minutes(&self) -> Option<u32> {
        self.end.as_deref().and_then(minutes_of_day)
    }

    /// Started but not yet stopped.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.start_minutes().is_some() && self.end.is_none()
    }

    /// Worked hours for this record.
    ///
    /// An explicit positive duration wins. Otherwise `end - start`, wrapping
    /// past midnight. In-progress or malformed records contribute zero.
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        if let Some(hours) = self.duration
            && hours.is_finite()
            && hours > 0.0
        {
            return hours;
        }
        match (self.start_minutes(), self.end_minutes()) {
            (Some(start), Some(end)) => f64::from(wrapping_span(start, end)) / 60.0,
            _ => 0.0,
        }
    }

    /// Earned amount with non-finite values treated as zero.
    #[must_use]
    pub fn earned_amount(&self) -> f64 {
        if self.earned.is_finite() { self.earned } else { 0.0 }
    }
}

/// Minutes from `start` to `end`, wrapping past midnight when `end < start`.
#[must_use]
pub fn wrapping_span(start: u32, end: u32) -> u32 {
    if end >= start {
        end - start
    } else {
        MINUTES_PER_DAY - start + end
    }
}

/// Parse `HH:MM` (or `HH:MM:SS`) into minutes since midnight.
#[must_use]
pub fn minutes_of_day(value: &str) -> Option<u32> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
        .map(|t| t.hour() * 60 + t.minute())
}

/// Calendar day identity of a group. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from year/month/day, `None` for impossible dates.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = DayKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| DayKeyError {
                input: s.to_string(),
            })
    }
}

/// A date string that is not a valid `YYYY-MM-DD` day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayKeyError {
    pub input: String,
}

impl fmt::Display for DayKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid day key {:?} (expected YYYY-MM-DD)", self.input)
    }
}

impl std::error::Error for DayKeyError {}
