// SPDX-License-Identifier: Apache-2.0

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use floorline_core::sha256_hex;

fn bench_sha256_fingerprint_input(c: &mut Criterion) {
    let input = "4b6f2f5e-8a1c-4a6e-9f1e-2d3c4b5a6f70-insert_beads-stage_complete-1709287205";
    c.bench_function("sha256_hex_fingerprint_input", |b| {
        b.iter(|| sha256_hex(black_box(input.as_bytes())))
    });
}

criterion_group!(benches, bench_sha256_fingerprint_input);
criterion_main!(benches);
