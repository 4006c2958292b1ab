// SPDX-License-Identifier: Apache-2.0

use floorline_model::{Event, Fingerprint, NewEvent, Unit, UnitId};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{InsertOutcome, Ledger, StoreError, StoreErrorCode};

#[derive(Default)]
struct State {
    units: HashMap<UnitId, Unit>,
    events: Vec<Event>,
    by_key: HashMap<Fingerprint, usize>,
}

/// Volatile ledger with the same uniqueness rules as the SQLite backend.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<State>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_count(&self) -> Result<usize, StoreError> {
        Ok(self.state.lock().map_err(|_| StoreError::poisoned())?.events.len())
    }
}

impl Ledger for MemoryLedger {
    fn find_unit(&self, unit_id: &UnitId) -> Result<Unit, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::poisoned())?;
        state.units.get(unit_id).cloned().ok_or_else(|| {
            StoreError::new(StoreErrorCode::NotFound, format!("unit {unit_id} not found"))
        })
    }

    fn find_event_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Event>, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::poisoned())?;
        Ok(state
            .by_key
            .get(fingerprint)
            .and_then(|idx| state.events.get(*idx))
            .cloned())
    }

    fn insert_event(&self, row: &NewEvent) -> Result<InsertOutcome, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::poisoned())?;
        if !state.units.contains_key(&row.unit_id) {
            return Err(StoreError::new(
                StoreErrorCode::NotFound,
                format!("unit {} not registered", row.unit_id),
            ));
        }
        if state.by_key.contains_key(&row.idempotency_key) {
            return Ok(InsertOutcome::Conflict);
        }
        let event = row.clone().into_event();
        let idx = state.events.len();
        state.events.push(event.clone());
        state.by_key.insert(row.idempotency_key.clone(), idx);
        Ok(InsertOutcome::Inserted(event))
    }

    fn list_events_for_unit(&self, unit_id: &UnitId) -> Result<Vec<Event>, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::poisoned())?;
        let mut out: Vec<Event> = state
            .events
            .iter()
            .filter(|e| e.unit_id == *unit_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            (a.ts_device, a.ts_server, a.id).cmp(&(b.ts_device, b.ts_server, b.id))
        });
        Ok(out)
    }

    fn register_unit(&self, unit: &Unit) -> Result<(), StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::poisoned())?;
        if state.units.contains_key(&unit.id) {
            return Err(StoreError::new(
                StoreErrorCode::Conflict,
                format!("unit {} already registered", unit.id),
            ));
        }
        state.units.insert(unit.id, unit.clone());
        Ok(())
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.state
            .lock()
            .map(|_| ())
            .map_err(|_| StoreError::poisoned())
    }
}
