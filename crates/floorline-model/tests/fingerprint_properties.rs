// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, TimeZone, Utc};
use floorline_model::{EventType, Fingerprint, Stage, UnitId, FINGERPRINT_HEX_LEN};
use proptest::prelude::*;
use uuid::Uuid;

fn instant(secs: i64, millis: u32) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, millis * 1_000_000)
        .single()
        .expect("valid instant")
}

fn stage_strategy() -> impl Strategy<Value = Stage> {
    prop::sample::select(Stage::ALL.to_vec())
}

fn type_strategy() -> impl Strategy<Value = EventType> {
    prop::sample::select(EventType::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn same_second_always_collapses(
        raw in any::<u128>(),
        stage in stage_strategy(),
        ty in type_strategy(),
        secs in -2_000_000_000i64..4_000_000_000i64,
        a in 0u32..1000,
        b in 0u32..1000,
    ) {
        let unit = UnitId::from_uuid(Uuid::from_u128(raw));
        prop_assert_eq!(
            Fingerprint::compute(&unit, stage, ty, &instant(secs, a)),
            Fingerprint::compute(&unit, stage, ty, &instant(secs, b))
        );
    }

    #[test]
    fn different_seconds_never_collapse(
        raw in any::<u128>(),
        stage in stage_strategy(),
        ty in type_strategy(),
        secs in 0i64..4_000_000_000i64,
        gap in 1i64..86_400,
        millis in 0u32..1000,
    ) {
        let unit = UnitId::from_uuid(Uuid::from_u128(raw));
        prop_assert_ne!(
            Fingerprint::compute(&unit, stage, ty, &instant(secs, millis)),
            Fingerprint::compute(&unit, stage, ty, &instant(secs + gap, millis))
        );
    }

    #[test]
    fn output_is_lowercase_hex(
        raw in any::<u128>(),
        stage in stage_strategy(),
        ty in type_strategy(),
        secs in 0i64..4_000_000_000i64,
    ) {
        let unit = UnitId::from_uuid(Uuid::from_u128(raw));
        let fp = Fingerprint::compute(&unit, stage, ty, &instant(secs, 0));
        prop_assert_eq!(fp.as_str().len(), FINGERPRINT_HEX_LEN);
        prop_assert!(fp.as_str().chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}

#[test]
fn stage_and_type_both_separate_keys() {
    let unit = UnitId::from_uuid(Uuid::from_u128(7));
    let ts = instant(1_709_287_205, 0);
    let base = Fingerprint::compute(&unit, Stage::Pack, EventType::StageStart, &ts);
    assert_ne!(base, Fingerprint::compute(&unit, Stage::Ship, EventType::StageStart, &ts));
    assert_ne!(base, Fingerprint::compute(&unit, Stage::Pack, EventType::StageComplete, &ts));
    let other = UnitId::from_uuid(Uuid::from_u128(8));
    assert_ne!(base, Fingerprint::compute(&other, Stage::Pack, EventType::StageStart, &ts));
}
