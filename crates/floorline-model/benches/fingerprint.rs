// SPDX-License-Identifier: Apache-2.0

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use floorline_model::{EventCandidate, EventSubmission, EventType, Fingerprint, Stage, UnitId};
use serde_json::json;

fn bench_fingerprint(c: &mut Criterion) {
    let unit = UnitId::parse("6f1c2b9a-0d4e-4f7a-8b3c-2e1d0c9b8a70").expect("unit");
    let ts = chrono::Utc::now();
    c.bench_function("fingerprint_compute", |b| {
        b.iter(|| {
            Fingerprint::compute(
                black_box(&unit),
                black_box(Stage::Pack),
                black_box(EventType::StageComplete),
                black_box(&ts),
            )
        })
    });

    let submission: EventSubmission = serde_json::from_value(json!({
        "unit_id": "6f1c2b9a-0d4e-4f7a-8b3c-2e1d0c9b8a70",
        "order_id": "0b7e5a52-8f0c-4a55-9d8e-3f1a2b4c5d6e",
        "stage": "pack",
        "type": "stage_complete",
        "ts_device": "2024-03-01T10:00:05.250Z",
        "qty_good": 4
    }))
    .expect("submission");
    c.bench_function("validate_and_fingerprint", |b| {
        b.iter(|| {
            EventCandidate::validate(black_box(&submission))
                .map(|candidate| candidate.fingerprint())
        })
    });
}

criterion_group!(benches, bench_fingerprint);
criterion_main!(benches);
