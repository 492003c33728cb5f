#![forbid(unsafe_code)]

//! Fingerprint-keyed cache of per-day metrics and record orderings.
//!
//! Rendering an open accordion needs the day's aggregates plus two sorted
//! views of its records. Recomputing them on every frame is wasteful, so the
//! results are cached under a [`Fingerprint`] of the group's record ids.
//!
//! # Invalidation
//!
//! Content addressing makes most invalidation automatic: a day whose record
//! set changes gets a new fingerprint. The engine additionally calls
//! [`MetricsCache::clear`] whenever the total record count changes or the daily
//! goal changes, since the goal feeds into every entry's status.
//!
//! # Eviction
//!
//! Capacity is bounded. When full, the oldest inserted entry is evicted first
//! (FIFO); lookups do not refresh an entry's age.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::grouping::{DayMetrics, breaks_after, chronological_order, day_metrics, display_order};
use crate::record::Record;

/// Default maximum number of cached days.
pub const DEFAULT_CAPACITY: usize = 1_000;

/// Content hash of a group's record ids, in order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Hash the ids of `records` in order.
    #[must_use]
    pub fn of_records(records: &[Record]) -> Self {
        let mut hasher = DefaultHasher::new();
        records.len().hash(&mut hasher);
        for record in records {
            record.id.hash(&mut hasher);
        }
        Self(hasher.finish())
    }
}

/// Everything the row renderer needs for one day, computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub metrics: DayMetrics,
    /// Indices into the group's records, latest start first.
    pub display_order: Vec<usize>,
    /// Indices into the group's records, earliest start first.
    pub chronological_order: Vec<usize>,
    /// Break after each record, indexed like the group's records.
    pub breaks_after: Vec<Option<u32>>,
}

impl GroupSummary {
    #[must_use]
    pub fn compute(records: &[Record], goal: Option<f64>) -> Self {
        let chronological_order = chronological_order(records);
        let breaks_after = breaks_after(records, &chronological_order);
        Self {
            metrics: day_metrics(records, goal),
            display_order: display_order(records),
            chronological_order,
            breaks_after,
        }
    }
}

/// Counters for judging how well the cache absorbs re-renders.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Days currently cached.
    pub entries: usize,
    /// Lookups answered from the cache since creation or [`MetricsCache::reset_stats`].
    pub hits: u64,
    /// Lookups that had to compute a summary.
    pub misses: u64,
    /// Days dropped to make room.
    pub evictions: u64,
    /// `hits / (hits + misses)`, zero before the first lookup.
    pub hit_rate: f64,
}

/// Bounded FIFO cache of [`GroupSummary`] values.
#[derive(Debug)]
pub struct MetricsCache {
    entries: HashMap<Fingerprint, GroupSummary>,
    /// Insertion order, oldest first.
    order: VecDeque<Fingerprint>,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Default for MetricsCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MetricsCache {
    /// Create a cache holding at most `capacity` days (minimum one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let reserve = capacity.min(1_024);
        Self {
            entries: HashMap::with_capacity(reserve),
            order: VecDeque::with_capacity(reserve),
            capacity,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached summary for `records`, computing it on a miss.
    pub fn get_or_compute(&mut self, records: &[Record], goal: Option<f64>) -> &GroupSummary {
        let key = Fingerprint::of_records(records);
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
            self.order.push_back(key);
        }
        match self.entries.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(GroupSummary::compute(records, goal)),
        }
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            daylog_core::trace!(entries = self.entries.len(), "metrics cache cleared");
        }
        self.entries.clear();
        self.order.clear();
    }

    /// Reset hit/miss/eviction counters.
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        let hit_rate = match lookups {
            0 => 0.0,
            n => self.hits as f64 / n as f64,
        };
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate,
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.order.pop_front() {
            self.entries.remove(&oldest);
            self.evictions += 1;
            daylog_core::trace!(capacity = self.capacity, evictions = self.evictions, "evicted oldest day summary");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(ids: &[&str]) -> Vec<Record> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                let start = format!("{:02}:00", 8 + i);
                let end = format!("{:02}:30", 8 + i);
                Record::new(*id, "2024-05-01")
                    .with_times(&start, Some(&end))
                    .with_earned(100.0)
            })
            .collect()
    }

    #[test]
    fn second_lookup_hits() {
        let mut cache = MetricsCache::new(10);
        let records = day(&["a", "b"]);
        let first = cache.get_or_compute(&records, None).clone();
        let second = cache.get_or_compute(&records, None).clone();
        assert_eq!(first, second);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        assert!((stats.hit_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn summary_has_both_orderings() {
        let mut cache = MetricsCache::default();
        let records = day(&["a", "b", "c"]);
        let summary = cache.get_or_compute(&records, Some(600.0));
        assert_eq!(summary.chronological_order, vec![0, 1, 2]);
        assert_eq!(summary.display_order, vec![2, 1, 0]);
        assert_eq!(summary.breaks_after, vec![Some(30), Some(30), None]);
        assert!((summary.metrics.total_hours - 1.5).abs() < 1e-9);
        assert_eq!(summary.metrics.status.map(|s| s.percent), Some(50));
    }

    #[test]
    fn different_ids_are_different_entries() {
        let mut cache = MetricsCache::new(10);
        cache.get_or_compute(&day(&["a", "b"]), None);
        cache.get_or_compute(&day(&["a", "c"]), None);
        cache.get_or_compute(&day(&["a"]), None);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().misses, 3);
    }

    #[test]
    fn oldest_entry_is_evicted_first() {
        let mut cache = MetricsCache::new(2);
        let a = day(&["a"]);
        let b = day(&["b"]);
        let c = day(&["c"]);
        cache.get_or_compute(&a, None);
        cache.get_or_compute(&b, None);
        // A hit does not refresh age.
        cache.get_or_compute(&a, None);
        cache.get_or_compute(&c, None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);

        cache.reset_stats();
        cache.get_or_compute(&b, None);
        cache.get_or_compute(&c, None);
        assert_eq!(cache.stats().hits, 2);
        cache.get_or_compute(&a, None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn clear_forces_recompute() {
        let mut cache = MetricsCache::new(4);
        let records = day(&["a"]);
        cache.get_or_compute(&records, None);
        cache.clear();
        assert!(cache.is_empty());
        cache.get_or_compute(&records, None);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn zero_capacity_still_caches_one() {
        let mut cache = MetricsCache::new(0);
        assert_eq!(cache.capacity(), 1);
        let records = day(&["a"]);
        cache.get_or_compute(&records, None);
        cache.get_or_compute(&records, None);
        assert_eq!(cache.stats().hits, 1);
    }
}
