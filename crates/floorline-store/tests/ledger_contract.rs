// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Duration, Utc};
use floorline_core::time::parse_rfc3339_utc;
use floorline_model::{
    BlockerCode, EventCandidate, EventId, EventPayload, EventType, NewEvent, OrderId, OrgId,
    Stage, Unit, UnitId,
};
use floorline_store::{
    InsertOutcome, Ledger, LedgerConfig, MemoryLedger, SqliteLedger, StoreErrorCode,
};
use std::sync::{Arc, Barrier};
use uuid::Uuid;

fn unit(n: u128) -> Unit {
    Unit {
        id: UnitId::from_uuid(Uuid::from_u128(n)),
        org_id: OrgId::from_uuid(Uuid::from_u128(1_000)),
        order_id: OrderId::from_uuid(Uuid::from_u128(2_000)),
        unit_number: u32::try_from(n).expect("small"),
    }
}

fn t0() -> DateTime<Utc> {
    parse_rfc3339_utc("2024-03-01T10:00:05.250Z").expect("t0")
}

fn row(unit: &Unit, stage: Stage, ty: EventType, ts: DateTime<Utc>) -> NewEvent {
    let candidate = EventCandidate {
        unit_id: unit.id,
        order_id: Some(unit.order_id),
        stage,
        event_type: ty,
        workstation_id: None,
        ts_device: ts,
        payload: EventPayload {
            qty_good: 3,
            blocker_code: (ty == EventType::Blocker).then_some(BlockerCode::Other),
            annotation_text: Some("päck ✓".to_string()),
            ..EventPayload::default()
        },
    };
    let fp = candidate.fingerprint();
    NewEvent::assemble(candidate, fp, unit, EventId::generate(), ts + Duration::milliseconds(40))
        .expect("assemble")
}

fn sqlite() -> (tempfile::TempDir, SqliteLedger) {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = SqliteLedger::open_path(dir.path().join("ledger.sqlite")).expect("open");
    (dir, ledger)
}

fn contract_suite(ledger: &dyn Ledger) {
    ledger.ping().expect("ping");
    let u = unit(1);
    ledger.register_unit(&u).expect("register");
    assert_eq!(
        ledger.register_unit(&u).expect_err("duplicate unit").code,
        StoreErrorCode::Conflict
    );
    assert_eq!(ledger.find_unit(&u.id).expect("find"), u);
    assert_eq!(
        ledger.find_unit(&unit(99).id).expect_err("missing").code,
        StoreErrorCode::NotFound
    );

    let first = row(&u, Stage::Pack, EventType::StageStart, t0());
    let stored = match ledger.insert_event(&first).expect("insert") {
        InsertOutcome::Inserted(e) => e,
        InsertOutcome::Conflict => panic!("fresh key reported as conflict"),
    };
    assert_eq!(stored.id, first.id);
    assert_eq!(
        ledger
            .find_event_by_fingerprint(&first.idempotency_key)
            .expect("lookup"),
        Some(stored.clone())
    );

    let mut again = row(&u, Stage::Pack, EventType::StageStart, t0());
    again.id = EventId::generate();
    assert_eq!(ledger.insert_event(&again).expect("dup"), InsertOutcome::Conflict);

    let later = row(&u, Stage::Pack, EventType::StageComplete, t0() + Duration::seconds(30));
    let earlier = row(&u, Stage::BeadPrep, EventType::Blocker, t0() - Duration::seconds(30));
    ledger.insert_event(&later).expect("later");
    ledger.insert_event(&earlier).expect("earlier");

    let history = ledger.list_events_for_unit(&u.id).expect("history");
    let ids: Vec<EventId> = history.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![earlier.id, first.id, later.id]);
    assert_eq!(history[0].payload.blocker_code, Some(BlockerCode::Other));
    assert_eq!(history[1], stored);
    assert!(ledger.list_events_for_unit(&unit(99).id).expect("empty").is_empty());

    let orphan = row(&unit(42), Stage::Ship, EventType::ShipmentDispatch, t0());
    assert_eq!(
        ledger.insert_event(&orphan).expect_err("orphan").code,
        StoreErrorCode::NotFound
    );
}

#[test]
fn memory_ledger_honours_contract() {
    contract_suite(&MemoryLedger::new());
}

#[test]
fn sqlite_ledger_honours_contract() {
    let (_dir, ledger) = sqlite();
    contract_suite(&ledger);
}

#[test]
fn sqlite_ledger_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ledger.sqlite");
    let u = unit(5);
    let r = row(&u, Stage::OrderInfo, EventType::StageStart, t0());
    {
        let ledger = SqliteLedger::open_path(&path).expect("open");
        ledger.register_unit(&u).expect("register");
        ledger.insert_event(&r).expect("insert");
    }
    let ledger = SqliteLedger::open(LedgerConfig {
        db_path: path,
        ..LedgerConfig::default()
    })
    .expect("reopen");
    let found = ledger
        .find_event_by_fingerprint(&r.idempotency_key)
        .expect("lookup")
        .expect("row present");
    assert_eq!(found.id, r.id);
    assert_eq!(found.ts_device, r.ts_device);
}

#[test]
fn concurrent_sqlite_inserts_admit_exactly_one_row() {
    let (_dir, ledger) = sqlite();
    let ledger = Arc::new(ledger);
    let u = unit(7);
    ledger.register_unit(&u).expect("register");

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            let r = row(&u, Stage::InsertBeads, EventType::StageComplete, t0());
            std::thread::spawn(move || {
                barrier.wait();
                ledger.insert_event(&r).expect("insert attempt")
            })
        })
        .collect();
    let outcomes: Vec<InsertOutcome> = handles
        .into_iter()
        .map(|h| h.join().expect("join"))
        .collect();
    let inserted = outcomes
        .iter()
        .filter(|o| matches!(o, InsertOutcome::Inserted(_)))
        .count();
    assert_eq!(inserted, 1);
    assert_eq!(ledger.list_events_for_unit(&u.id).expect("history").len(), 1);
}
