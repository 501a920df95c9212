//! 🧪 split_bench — receipts for the claim that labeling is "basically free".
//!
//! The split math runs once per key on sixty-thousand-object buckets, so it had
//! better be integer arithmetic and nothing else. These benches exist to notice
//! if someone sneaks an allocation into the hot loop. 🦆

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use trisect::category::category_of;
use trisect::splits::{SplitPercents, SplitPlan};
use trisect::tally::CategoryTally;

fn bench_label_assignment(c: &mut Criterion) {
    let percents = SplitPercents {
        percent_training: 80,
        percent_validation: 10,
    };
    let plan = SplitPlan::for_category(61_578, percents);

    c.bench_function("label_61578_ordinals", |b| {
        b.iter(|| {
            for ordinal in 0..61_578u64 {
                black_box(plan.label(black_box(ordinal)));
            }
        })
    });
}

fn bench_category_derivation(c: &mut Criterion) {
    let keys: Vec<String> = (0..10_000)
        .map(|i| format!("impressionism/starry_but_legally_distinct_{i}.png"))
        .collect();

    c.bench_function("category_of_10k_keys", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(category_of(black_box(key)));
            }
        })
    });
}

fn bench_tally_pass(c: &mut Criterion) {
    // 🧮 10 categories x 1k keys, contiguous, like a real lexicographic listing.
    let keys: Vec<String> = (0..10)
        .flat_map(|cat| (0..1_000).map(move |i| format!("category_{cat:02}/img_{i:04}.png")))
        .collect();

    c.bench_function("tally_10k_contiguous_keys", |b| {
        b.iter(|| {
            let mut tally = CategoryTally::new();
            for key in &keys {
                tally.observe(black_box(key)).expect("contiguous by construction");
            }
            black_box(tally.finish());
        })
    });
}

criterion_group!(
    benches,
    bench_label_assignment,
    bench_category_derivation,
    bench_tally_pass
);
criterion_main!(benches);
