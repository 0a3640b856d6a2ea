//! Benchmarks for the window and Rt computations
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate};
use covid_dashboard::analysis::{estimate_rt, estimate_rt_table, rolling_sum};
use covid_dashboard::data::{DailySeries, RegionalRecord, RegionalTable};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 5, 13).unwrap()
}

fn create_series(days: usize) -> DailySeries {
    DailySeries::from_values(
        start(),
        (0..days).map(|i| 100.0 + 50.0 * ((i as f64) / 7.0).sin()),
    )
}

fn create_table(regions: usize, days: usize) -> RegionalTable {
    let records: Vec<RegionalRecord> = (0..regions)
        .flat_map(|r| {
            (0..days).map(move |d| RegionalRecord {
                code: format!("{:02}", r + 1),
                date: start() + Duration::days(d as i64),
                positive: (r * 3 + d % 11) as f64,
                tested: 100.0,
            })
        })
        .collect();
    RegionalTable::from_records(&records)
}

fn bench_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("window");

    for days in [100, 365, 1000] {
        let series = create_series(days);
        group.throughput(Throughput::Elements(days as u64));

        group.bench_function(format!("rolling_sum_{}", days), |b| {
            b.iter(|| rolling_sum(black_box(&series), 14).unwrap())
        });

        group.bench_function(format!("estimate_rt_{}", days), |b| {
            b.iter(|| estimate_rt(black_box(&series), 14).unwrap())
        });
    }

    group.finish();
}

fn bench_rt_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("rt_table");

    // Roughly the department count over most of a year
    let table = create_table(101, 300);
    group.throughput(Throughput::Elements(101 * 300));

    group.bench_function("estimate_rt_table_101x300", |b| {
        b.iter(|| estimate_rt_table(black_box(&table), 14).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_window, bench_rt_table);
criterion_main!(benches);
