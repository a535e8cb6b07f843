//! FILENAME: row-model/benches/pipeline_calculations.rs
//! Benchmarks for the full row-model pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use row_model::{ColumnDef, Table, TableConfig};
use table_engine::{CellValue, ColumnFilter, ColumnSort, Record};

const STATUSES: [&str; 3] = ["Active", "Pending", "Closed"];
const REGIONS: [&str; 4] = ["EU", "US", "APAC", "LATAM"];

fn sample_records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::new()
                .with("name", format!("item{}", i).as_str())
                .with("status", STATUSES[i % STATUSES.len()])
                .with("region", REGIONS[i % REGIONS.len()])
                .with("amount", ((i * 37) % 1000) as f64)
        })
        .collect()
}

fn sample_table(n: usize) -> Table {
    Table::new(
        sample_records(n),
        TableConfig::new(vec![
            ColumnDef::new("name"),
            ColumnDef::new("status"),
            ColumnDef::new("region"),
            ColumnDef::new("amount"),
        ]),
    )
    .unwrap()
}

fn bench_filter_sort_paginate(c: &mut Criterion) {
    c.bench_function("filter_sort_paginate_10k", |b| {
        let mut table = sample_table(10_000);
        table.set_column_filters(vec![ColumnFilter {
            id: "status".to_string(),
            value: CellValue::text("Active"),
        }]);
        table.set_sorting(vec![ColumnSort {
            id: "amount".to_string(),
            desc: true,
        }]);
        b.iter(|| {
            // Force a fresh pass each iteration.
            table.set_page_size(50);
            table.set_records(sample_records(10_000));
            black_box(table.paginated_row_model().len())
        });
    });
}

fn bench_grouping(c: &mut Criterion) {
    c.bench_function("group_aggregate_10k", |b| {
        let mut table = sample_table(10_000);
        table.set_grouping(vec!["region".to_string(), "status".to_string()]);
        b.iter(|| {
            table.set_records(sample_records(10_000));
            black_box(table.grouped_row_model().len())
        });
    });
}

fn bench_memoized_repeat(c: &mut Criterion) {
    c.bench_function("memoized_repeat_pass", |b| {
        let mut table = sample_table(10_000);
        table.set_sorting(vec![ColumnSort {
            id: "amount".to_string(),
            desc: false,
        }]);
        table.paginated_row_model();
        b.iter(|| black_box(table.paginated_row_model().len()));
    });
}

criterion_group!(
    benches,
    bench_filter_sort_paginate,
    bench_grouping,
    bench_memoized_repeat
);
criterion_main!(benches);
