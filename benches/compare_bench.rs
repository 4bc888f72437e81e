use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use secondary_sort::{
    CompositeKey, FullComparator, GroupComparator, RawComparator, Shuffle, ShuffleOptions,
};

fn random_keys(n: usize) -> Vec<CompositeKey> {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    (0..n)
        .map(|_| {
            CompositeKey::new(
                format!("user_{:04}", rng.gen_range(0..1000)),
                format!("{:010}", rng.r#gen::<u32>()),
            )
        })
        .collect()
}

fn bench_compare(c: &mut Criterion) {
    let keys = random_keys(10_000);
    let encoded: Vec<Vec<u8>> = keys.iter().map(CompositeKey::encode).collect();
    let full = FullComparator::ascending();
    let group = GroupComparator::ascending();

    c.bench_function("sort_object_10k", |b| {
        b.iter_batched(
            || keys.clone(),
            |mut keys| keys.sort_by(|x, y| full.compare(x, y)),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("sort_raw_10k", |b| {
        b.iter_batched(
            || encoded.clone(),
            |mut encoded| encoded.sort_by(|x, y| full.compare_raw(x, y).unwrap()),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("group_raw_scan_10k", |b| {
        let mut sorted = encoded.clone();
        sorted.sort_by(|x, y| full.compare_raw(x, y).unwrap());
        b.iter(|| {
            sorted
                .windows(2)
                .filter(|w| group.compare_raw(&w[0], &w[1]).unwrap().is_ne())
                .count()
        })
    });
}

fn bench_shuffle(c: &mut Criterion) {
    let keys = random_keys(10_000);
    c.bench_function("secondary_sort_shuffle_10k", |b| {
        b.iter(|| {
            let mut shuffle = Shuffle::secondary_sort(ShuffleOptions::default().with_partitions(8));
            for k in &keys {
                shuffle.emit(k, k.second().as_bytes());
            }
            shuffle.finish().unwrap()
        })
    });
}

criterion_group!(benches, bench_compare, bench_shuffle);
criterion_main!(benches);
