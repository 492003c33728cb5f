//! End-to-end scenarios for the grouped list engine.
//!
//! Each test drives [`GroupedList`] the way a host would: hand over records,
//! report the viewport, tick once per frame, and read back heights, ranges
//! and events.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use daylog_list::{DayKey, GroupedList, ListConfig, ListEvent, Record, RowContext};

fn date_of(day: usize) -> String {
    let first = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    (first + Days::new(day as u64)).format("%Y-%m-%d").to_string()
}

/// `count` records spread round-robin across `days` consecutive days.
fn spread(count: usize, days: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let date = date_of(i % days);
            let hour = 8 + (i / days) % 10;
            Record::new(format!("r{i}"), date)
                .with_times(&format!("{hour:02}:00"), Some(&format!("{hour:02}:45")))
                .with_earned(30.0)
        })
        .collect()
}

fn key(s: &str) -> DayKey {
    s.parse().unwrap()
}

#[test]
fn thousand_records_in_thirty_groups_ready_after_one_tick() {
    // A placeholder height distinct from the header makes assignment visible.
    let config = ListConfig::default()
        .with_batch_size(50)
        .with_default_row_height(1);
    let mut list = GroupedList::new(config);
    list.set_viewport_height(800);
    list.set_records(spread(1_000, 30).into());

    assert_eq!(list.group_count(), 30);
    assert!((0..30).all(|i| list.row_height(i) == Some(1)));

    assert_eq!(list.tick(), 1);
    assert!(list.heights_ready());
    assert!((0..30).all(|i| list.row_height(i) == Some(60)));
    assert_eq!(list.total_height(), 30 * 60);
    assert!(
        list.drain_events()
            .contains(&ListEvent::HeightsReady { rows: 30 })
    );
    assert_eq!(list.pending_tasks(), 0);
}

#[test]
fn scroll_5000_with_800_viewport_resolves_intersecting_rows() {
    let mut list = GroupedList::new(ListConfig::default().with_default_row_height(60));
    list.set_viewport(5_000, 800);
    list.set_records(spread(150, 150).into());
    list.settle(10);

    let visible = list.visible_range();
    assert_eq!(visible, 83..97);
    // The span of the visible rows covers [5000, 5800).
    assert!(list.cumulative_offset(visible.start) <= 5_000);
    assert!(list.cumulative_offset(visible.end) >= 5_800);
    assert!(list.cumulative_offset(visible.start + 1) > 5_000);
    assert!(list.cumulative_offset(visible.end - 1) < 5_800);
    // Regular density overscans five rows each way.
    assert_eq!(list.render_range(), 78..102);
}

fn list_with_may_first() -> (GroupedList, DayKey, usize) {
    let mut records = spread(40, 8);
    records.extend((0..10).map(|i| {
        Record::new(format!("may-{i}"), "2024-05-01")
            .with_times("09:00", Some("09:30"))
            .with_earned(20.0)
    }));
    let mut list = GroupedList::default();
    list.set_viewport(0, 800);
    list.set_records(records.into());
    list.settle(10);
    let day = key("2024-05-01");
    let index = list.index_of(&day).unwrap();
    (list, day, index)
}

#[test]
fn opening_ten_record_day_gives_556() {
    let (mut list, day, index) = list_with_may_first();
    assert_eq!(index, 0);
    assert_eq!(list.row_height(index), Some(60));

    assert!(list.toggle(&day));
    list.tick();
    // The apply lands on the second tick.
    assert_eq!(list.row_height(index), Some(60));
    list.tick();
    assert_eq!(list.row_height(index), Some(556));
    assert_eq!(list.cumulative_offset(1), 556);
}

#[test]
fn closing_again_reverts_to_header() {
    let (mut list, day, index) = list_with_may_first();
    list.toggle(&day);
    list.settle(10);
    assert_eq!(list.row_height(index), Some(556));

    list.toggle(&day);
    list.settle(10);
    assert_eq!(list.row_height(index), Some(60));
    assert!(!list.is_open(&day));
}

#[test]
fn new_group_triggers_full_rebuild() {
    let config = ListConfig::default().with_default_row_height(1);
    let mut list = GroupedList::new(config);
    list.set_viewport_height(800);
    let base = spread(1_000, 30);
    list.set_records(base.clone().into());
    list.settle(10);
    assert_eq!(list.stats().full_rebuilds, 1);

    let mut grown = base;
    grown.push(Record::new("extra", "2024-06-15"));
    list.set_records(grown.clone().into());
    assert_eq!(list.group_count(), 31);
    assert_eq!(list.stats().full_rebuilds, 2);
    // Every row went back to the placeholder, not just the new one.
    assert!((0..31).all(|i| list.row_height(i) == Some(1)));
    list.tick();
    assert!((0..31).all(|i| list.row_height(i) == Some(60)));

    // Same group count: heights are refreshed in place.
    let mut same_days = grown;
    same_days.push(Record::new("another", &date_of(3)));
    list.set_records(same_days.into());
    assert_eq!(list.group_count(), 31);
    assert_eq!(list.stats().full_rebuilds, 2);
    assert_eq!(list.stats().refreshes, 1);
    assert!((0..31).all(|i| list.row_height(i) == Some(60)));
}

#[test]
fn identical_collection_is_not_regrouped() {
    let records: Arc<[Record]> = spread(300, 30).into();
    let mut list = GroupedList::default();
    list.set_viewport_height(400);
    list.set_records(Arc::clone(&records));
    list.settle(10);

    for _ in 0..5 {
        assert!(!list.set_records(Arc::clone(&records)));
        list.tick();
    }
    assert_eq!(list.stats().regroups, 1);
}

#[test]
fn metrics_are_computed_once_per_day() {
    let mut list = GroupedList::default();
    list.set_viewport(0, 300);
    list.set_records(spread(300, 30).into());
    list.settle(10);

    let mut hours = Vec::new();
    for _ in 0..3 {
        list.render(&mut |row: RowContext<'_>| {
            hours.push(row.summary.metrics.total_hours);
        });
    }
    let stats = list.metrics_stats();
    // 5 visible rows plus 5 overscan below.
    assert_eq!(stats.misses, 10);
    assert_eq!(stats.hits, 20);
    // 10 records per day, 45 minutes each.
    assert!(hours.iter().all(|h| (h - 7.5).abs() < 1e-9));
}

#[test]
fn goal_change_invalidates_cached_status() {
    let mut list = GroupedList::default();
    list.set_viewport(0, 60);
    list.set_records(spread(10, 1).into());
    list.settle(10);

    let mut statuses = Vec::new();
    list.render(&mut |row: RowContext<'_>| statuses.push(row.summary.metrics.status));
    list.set_daily_goal(Some(300.0));
    list.render(&mut |row: RowContext<'_>| statuses.push(row.summary.metrics.status));

    assert_eq!(statuses[0], None);
    let status = statuses[1].unwrap();
    assert_eq!(status.percent, 100);
    assert_eq!(list.metrics_stats().misses, 2);
}

#[test]
fn range_changes_are_reported_once() {
    let mut list = GroupedList::new(ListConfig::default().with_overscan(0));
    list.set_viewport(0, 120);
    list.set_records(spread(20, 20).into());
    list.settle(10);
    let events = list.drain_events();
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, ListEvent::VisibleRangeChanged { .. }))
            .count(),
        1
    );

    // Row 2 starts peeking in at the bottom.
    list.set_scroll_offset(10);
    assert_eq!(
        list.drain_events(),
        vec![ListEvent::VisibleRangeChanged { start: 0, end: 3 }]
    );
    list.set_scroll_offset(20);
    assert!(list.drain_events().is_empty());
    list.set_scroll_offset(60);
    assert_eq!(
        list.drain_events(),
        vec![ListEvent::VisibleRangeChanged { start: 1, end: 3 }]
    );
}

#[test]
fn teardown_mid_init_leaves_no_work() {
    let mut list = GroupedList::new(ListConfig::default().with_batch_size(10));
    list.set_viewport_height(800);
    list.set_records(spread(500, 100).into());
    list.tick();
    assert!(!list.heights_ready());
    list.teardown();
    for _ in 0..20 {
        assert_eq!(list.tick(), 0);
    }
    assert_eq!(list.pending_tasks(), 0);
    assert!(!list.scroll_to_index(0));
}

#[test]
fn replacing_records_drops_pending_toggle_apply() {
    let mut list = GroupedList::default();
    list.set_viewport(0, 600);
    list.set_records(spread(400, 40).into());
    list.settle(10);
    list.drain_events();

    // Oldest day sits below the fold, so an apply would start a scroll.
    let day = key(&date_of(0));
    assert_eq!(list.index_of(&day), Some(39));
    list.toggle(&day);
    list.tick();
    assert_eq!(list.row_height(39), Some(60));

    list.set_records(spread(400, 40).into());
    // Only the refresh batch is left.
    assert_eq!(list.pending_tasks(), 1);
    list.settle(100);

    assert_eq!(list.stats().refreshes, 1);
    assert_eq!(list.stats().heights_applied, 0);
    assert_eq!(list.row_height(39), Some(556));
    assert!(list.is_open(&day));
    assert!(!list.is_scrolling());
    assert_eq!(list.scroll_offset(), 0);
    assert!(
        !list
            .drain_events()
            .iter()
            .any(|e| matches!(e, ListEvent::ScrollTo { .. }))
    );
}

#[test]
fn malformed_records_are_dropped() {
    let mut records = spread(20, 2);
    records.push(Record::new("bad", "yesterday"));
    let mut no_date = Record::new("none", "2024-04-01");
    no_date.date = None;
    records.push(no_date);

    let mut list = GroupedList::default();
    list.set_records(records.into());
    assert_eq!(list.group_count(), 2);
    assert_eq!(list.groups().iter().map(|g| g.len()).sum::<usize>(), 20);
}
