//! Benchmarks `FixedBitSet` against a naive `[bool; 256]` reference.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ecs_memory_core::FixedBitSet;

fn naive_has_all(a: &[bool; 256], b: &[bool; 256]) -> bool {
    a.iter().zip(b.iter()).all(|(&x, &y)| !y || x)
}

fn naive_union(a: &mut [bool; 256], b: &[bool; 256]) {
    for i in 0..256 {
        a[i] |= b[i];
    }
}

fn bitset_union(c: &mut Criterion) {
    let a = FixedBitSet::many((0..256u16).step_by(3));
    let b = FixedBitSet::many((0..256u16).step_by(5));

    c.bench_function("FixedBitSet::add (SIMD dispatch)", |bench| {
        bench.iter(|| {
            let mut x = black_box(a);
            x.add(black_box(&b));
            x
        })
    });

    let naive_a: [bool; 256] = std::array::from_fn(|i| i % 3 == 0);
    let naive_b: [bool; 256] = std::array::from_fn(|i| i % 5 == 0);
    c.bench_function("naive [bool; 256] union", |bench| {
        bench.iter(|| {
            let mut x = black_box(naive_a);
            naive_union(&mut x, black_box(&naive_b));
            x
        })
    });
}

fn bitset_has_all(c: &mut Criterion) {
    let a = FixedBitSet::many(0..200u16);
    let b = FixedBitSet::many(50..150u16);

    c.bench_function("FixedBitSet::has_all (SIMD dispatch)", |bench| {
        bench.iter(|| black_box(a).has_all(black_box(&b)))
    });

    let naive_a: [bool; 256] = std::array::from_fn(|i| i < 200);
    let naive_b: [bool; 256] = std::array::from_fn(|i| (50..150).contains(&i));
    c.bench_function("naive [bool; 256] has_all", |bench| {
        bench.iter(|| naive_has_all(black_box(&naive_a), black_box(&naive_b)))
    });
}

criterion_group!(benches, bitset_union, bitset_has_all);
criterion_main!(benches);
