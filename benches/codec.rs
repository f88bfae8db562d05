//! Benchmarks for the CSV codec.
//!
//! Benchmark targets:
//! - Slug tokenizing: <10us per value
//! - Property-text encode/decode: <50us per cell
//! - Full table export: <50ms for 1000 rows

// Criterion macros generate items without docs - this is expected for benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use tablesmith::codec::property_text::{decode, encode};
use tablesmith::storage::SqliteStore;
use tablesmith::{EntityKind, ExportService, ImportService, Record, SchemaRegistry, Value, slugify};

const SHORT_TEXT: &str = "Flame Sword";
const LONG_TEXT: &str = "  Épée de Feu du Dragon Ancien: édition « collector » (niveau 99)!  ";
const STRUCT_CELL: &str =
    r#"((stat_id="01HP",value=100,scale=1.5),(stat_id="01ATK",value=10,scale=0.25),(stat_id="01DEF",value=-4,scale=2.0))"#;

fn item(i: usize) -> Record {
    let mut record = Record::new();
    record.insert("id".to_string(), Value::Str(format!("01ITEM{i:06}")));
    record.insert("slug".to_string(), Value::Str(format!("item-{}", i % 250)));
    record.insert("name".to_string(), Value::Str(format!("Item {i}")));
    record.insert("type".to_string(), Value::from("Weapon"));
    record.insert("rarity".to_string(), Value::from("Rare"));
    record.insert("stat_damage".to_string(), Value::Float(12.5));
    record.insert("tags".to_string(), Value::from(vec!["melee", "fire"]));
    record
}

fn seeded_store(rows: usize) -> Arc<SqliteStore> {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    for i in 0..rows {
        store.upsert(EntityKind::Items, &item(i)).unwrap();
    }
    store
}

fn bench_slugify(c: &mut Criterion) {
    let mut group = c.benchmark_group("slugify");

    group.bench_function("short", |b| {
        b.iter(|| slugify(black_box(SHORT_TEXT)));
    });
    group.bench_function("diacritics", |b| {
        b.iter(|| slugify(black_box(LONG_TEXT)));
    });

    group.finish();
}

fn bench_property_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_text");
    let value = decode(STRUCT_CELL).unwrap();

    group.bench_function("decode_struct_array", |b| {
        b.iter(|| decode(black_box(STRUCT_CELL)));
    });
    group.bench_function("encode_struct_array", |b| {
        b.iter(|| encode(black_box(&value)));
    });

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    group.measurement_time(Duration::from_secs(10));
    let schemas = Arc::new(SchemaRegistry::builtin().unwrap());

    for rows in [100_usize, 1000] {
        let service = ExportService::new(seeded_store(rows), Arc::clone(&schemas));
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("items", rows), &rows, |b, _| {
            b.iter(|| service.export(black_box(EntityKind::Items)).unwrap());
        });
    }

    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");
    group.measurement_time(Duration::from_secs(10));
    let schemas = Arc::new(SchemaRegistry::builtin().unwrap());

    for rows in [100_usize, 1000] {
        let store = seeded_store(rows);
        let csv = ExportService::new(store.clone(), Arc::clone(&schemas))
            .export(EntityKind::Items)
            .unwrap();
        let service = ImportService::new(store, Arc::clone(&schemas));
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("items", rows), &csv, |b, csv| {
            b.iter(|| service.import(EntityKind::Items, black_box(csv)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_slugify,
    bench_property_text,
    bench_export,
    bench_import
);
criterion_main!(benches);
