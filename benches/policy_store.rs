use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rule_table_adapter::{FieldFilter, Filter, SqliteAdapter};

/// In-memory store seeded with `count` permission rules and a few grouping rules
fn seeded_store(count: usize) -> SqliteAdapter {
    let mut adapter = SqliteAdapter::open_in_memory().unwrap();

    let rules: Vec<Vec<String>> = (0..count)
        .map(|i| {
            vec![
                format!("user{}", i % 100),
                format!("data{}", i),
                if i % 2 == 0 { "read" } else { "write" }.to_string(),
            ]
        })
        .collect();
    adapter.insert_many("p", &rules).unwrap();

    for i in 0..10 {
        adapter
            .insert_one("g", &[format!("user{}", i), "admin".to_string()])
            .unwrap();
    }

    adapter
}

/// Benchmark full loads (scan + decode)
fn bench_load_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_all");

    for count in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut adapter = seeded_store(count);
            b.iter(|| {
                let rules = adapter.load_all().unwrap();
                black_box(rules);
            });
        });
    }

    group.finish();
}

/// Benchmark filtered loads selecting one subject
fn bench_load_filtered(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_filtered");

    for count in [1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut adapter = seeded_store(count);
            let filter = Filter::from(FieldFilter::new().with("ptype", "p").with("v0", "user7"));
            b.iter(|| {
                let rules = adapter.load_filtered(&filter).unwrap();
                black_box(rules);
            });
        });
    }

    group.finish();
}

/// Benchmark transactional batch inserts
fn bench_insert_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_many");

    for batch in [10, 100, 1_000] {
        group.throughput(Throughput::Elements(batch as u64));

        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            let rules: Vec<[String; 3]> = (0..batch)
                .map(|i| [format!("user{}", i), format!("data{}", i), "read".to_string()])
                .collect();

            b.iter(|| {
                let mut adapter = SqliteAdapter::open_in_memory().unwrap();
                black_box(adapter.insert_many("p", &rules).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_load_all, bench_load_filtered, bench_insert_many);
criterion_main!(benches);
