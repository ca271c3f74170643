//! Benchmark for barcode normalization and trait derivation.
//!
//! Run with: cargo bench --package barbeast_procedural --bench barcode_benchmark

use barbeast_procedural::{normalize_to_ean13, BarcodeTraits};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn benchmark_normalize(c: &mut Criterion) {
    let inputs = ["4006381333931", "0-12345-67890-5", "1234 5670", "not a barcode"];

    c.bench_function("normalize_mixed_formats", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % inputs.len();
            black_box(normalize_to_ean13(black_box(inputs[i])))
        });
    });
}

fn benchmark_derive_traits(c: &mut Criterion) {
    let Ok(code) = normalize_to_ean13("4006381333931") else {
        return;
    };

    c.bench_function("derive_barcode_traits", |b| {
        b.iter(|| black_box(BarcodeTraits::derive(black_box(&code))));
    });
}

criterion_group!(benches, benchmark_normalize, benchmark_derive_traits);
criterion_main!(benches);
