// Criterion benchmarks for Workwear Sizing

use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use std::collections::HashMap;
use uuid::Uuid;
use workwear_sizing::core::{build_distribution, parse_measurement, SizeResolver};
use workwear_sizing::models::{
    Garment, MeasurementInput, MeasurementSlot, RuleTable, SizeCount, SizeRule, SlotLayout,
};

const MEASURE_KEYS: [&str; 4] = ["chest", "waist", "hip", "inseam"];

/// Rule table with `labels` consecutive ranges per measure key
fn create_rule_table(labels: usize) -> RuleTable {
    let garment_id = Uuid::new_v4();
    let mut rules = Vec::with_capacity(labels * MEASURE_KEYS.len());

    for (k, key) in MEASURE_KEYS.iter().enumerate() {
        for i in 0..labels {
            let min = 60 + (i as i32) * 4;
            rules.push(SizeRule {
                id: Uuid::new_v4(),
                garment_id,
                measure_key: key.to_string(),
                label: (34 + i * 2).to_string(),
                min_value: min,
                max_value: min + 3,
                priority: (k as i32) % 2,
            });
        }
    }

    RuleTable::from_rules(rules)
}

fn create_layout() -> SlotLayout {
    SlotLayout::from_slots(
        MEASURE_KEYS
            .iter()
            .enumerate()
            .map(|(i, key)| MeasurementSlot::new(i as u16 + 1, *key))
            .collect(),
    )
}

fn create_input() -> MeasurementInput {
    let mut input = HashMap::new();
    input.insert("chest".to_string(), "98".to_string());
    input.insert("waist".to_string(), "84,5".to_string());
    input.insert("hip".to_string(), "250".to_string());
    input.insert("inseam".to_string(), "81.2".to_string());
    input
}

fn bench_parse_measurement(c: &mut Criterion) {
    c.bench_function("parse_measurement", |b| {
        b.iter(|| {
            parse_measurement(black_box(" 84,5 "))
        });
    });
}

fn bench_resolve(c: &mut Criterion) {
    let resolver = SizeResolver::default();
    let layout = create_layout();
    let input = create_input();

    let mut group = c.benchmark_group("resolve");

    for label_count in [4, 12, 48, 200].iter() {
        let table = create_rule_table(*label_count);

        group.bench_with_input(
            BenchmarkId::new("resolve", label_count),
            label_count,
            |b, _| {
                b.iter(|| {
                    resolver.resolve(
                        black_box(&layout),
                        black_box(&table),
                        black_box(&input),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_distribution(c: &mut Criterion) {
    let garments: HashMap<Uuid, Garment> = (0..50)
        .map(|i| {
            let garment = Garment {
                id: Uuid::new_v4(),
                key: format!("garment_{:02}", i),
                description: None,
                category: format!("category_{}", i % 5),
            };
            (garment.id, garment)
        })
        .collect();

    let counts: Vec<SizeCount> = garments
        .keys()
        .flat_map(|id| {
            ["S", "M", "L", "XL"].iter().map(move |label| SizeCount {
                garment_id: *id,
                size_label: label.to_string(),
                count: 3,
            })
        })
        .collect();

    c.bench_function("distribution_50_garments", |b| {
        b.iter(|| {
            black_box(build_distribution(counts.clone(), &garments))
        });
    });
}

criterion_group!(
    benches,
    bench_parse_measurement,
    bench_resolve,
    bench_distribution
);
criterion_main!(benches);
