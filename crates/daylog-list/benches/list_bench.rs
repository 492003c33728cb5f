//! Benchmarks for the grouped list hot paths.
//!
//! Run with: cargo bench -p daylog-list

use std::hint::black_box;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use daylog_list::{GroupedList, ListConfig, Record, RowContext, RowHeights, resolve};

fn records(days: usize, per_day: usize) -> Arc<[Record]> {
    let first = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..days * per_day)
        .map(|i| {
            let date = (first + Days::new((i % days) as u64)).format("%Y-%m-%d").to_string();
            Record::new(format!("r{i}"), date)
                .with_times("09:00", Some("10:00"))
                .with_earned(40.0)
        })
        .collect()
}

fn mixed_heights(rows: usize) -> RowHeights {
    let mut heights = RowHeights::with_uniform(rows, 60);
    for i in (0..rows).step_by(7) {
        heights.set_row_height(i, 556);
    }
    heights
}

// ============================================================================
// Windowing
// ============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("list/resolve");

    for rows in [1_000, 10_000, 100_000] {
        let heights = mixed_heights(rows);
        let total = heights.total_height();
        group.bench_with_input(BenchmarkId::new("sweep", rows), &rows, |b, _| {
            let mut offset = 0u32;
            b.iter(|| {
                offset = (offset + 997) % total;
                black_box(resolve(offset, 900, &heights, 5))
            })
        });
    }

    group.finish();
}

fn bench_set_row_height(c: &mut Criterion) {
    let mut group = c.benchmark_group("list/set_row_height");

    for rows in [1_000, 100_000] {
        let mut heights = RowHeights::with_uniform(rows, 60);
        group.bench_with_input(BenchmarkId::new("flip", rows), &rows, |b, &rows| {
            let mut i = 0usize;
            b.iter(|| {
                i = (i + 131) % rows;
                let next = if heights.row_height(i) == Some(60) { 556 } else { 60 };
                black_box(heights.set_row_height(i, next))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Engine
// ============================================================================

fn bench_toggle_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("list/toggle");

    for days in [200, 2_000] {
        let mut list = GroupedList::new(ListConfig::default());
        list.set_viewport(0, 900);
        list.set_records(records(days, 5));
        list.settle(1_000);
        let keys: Vec<_> = list.groups().iter().map(|g| g.key()).collect();

        group.bench_with_input(BenchmarkId::new("open_close", days), &days, |b, _| {
            let mut i = 0usize;
            b.iter(|| {
                i = (i + 17) % keys.len();
                list.toggle(&keys[i]);
                list.tick();
                list.tick();
                list.toggle(&keys[i]);
                list.tick();
                list.tick();
                list.set_scroll_offset(0);
                black_box(list.total_height())
            })
        });
    }

    group.finish();
}

fn bench_initial_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("list/load");
    let data = records(1_000, 10);

    group.bench_function("set_records_and_settle", |b| {
        b.iter(|| {
            let mut list = GroupedList::new(ListConfig::default());
            list.set_viewport_height(900);
            list.set_records(Arc::clone(&data));
            black_box(list.settle(1_000))
        })
    });

    group.finish();
}

fn bench_render_window(c: &mut Criterion) {
    let mut list = GroupedList::new(ListConfig::default());
    list.set_viewport(12_000, 900);
    list.set_records(records(2_000, 8));
    list.settle(1_000);

    c.bench_function("list/render_window", |b| {
        b.iter(|| {
            let mut earned = 0.0;
            list.render(&mut |row: RowContext<'_>| earned += row.summary.metrics.total_earned);
            black_box(earned)
        })
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_set_row_height,
    bench_toggle_cycle,
    bench_initial_load,
    bench_render_window,
);
criterion_main!(benches);
