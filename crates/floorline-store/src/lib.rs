// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Ledger port for recorded events plus its SQLite and in-memory backends.
//!
//! Deduplication correctness rests on the backend's uniqueness rule over
//! `idempotency_key`; callers never lock around the lookup/insert pair.

mod error;
mod memory;
mod sqlite;

use floorline_model::{Event, Fingerprint, NewEvent, Unit, UnitId};
use std::sync::Arc;

pub use error::{StoreError, StoreErrorCode};
pub use memory::MemoryLedger;
pub use sqlite::{LedgerConfig, SqliteLedger, LEDGER_SCHEMA_VERSION};

pub const CRATE_NAME: &str = "floorline-store";

/// Result of an insert attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Event),
    /// Another row already holds the idempotency key.
    Conflict,
}

pub trait Ledger: Send + Sync {
    /// `NotFound` when no unit has this id.
    fn find_unit(&self, unit_id: &UnitId) -> Result<Unit, StoreError>;
    fn find_event_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Event>, StoreError>;
    fn insert_event(&self, row: &NewEvent) -> Result<InsertOutcome, StoreError>;
    /// Ordered by device time, then server time, then id.
    fn list_events_for_unit(&self, unit_id: &UnitId) -> Result<Vec<Event>, StoreError>;
    /// `Conflict` when the unit id is taken.
    fn register_unit(&self, unit: &Unit) -> Result<(), StoreError>;
    fn ping(&self) -> Result<(), StoreError>;
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn find_unit(&self, unit_id: &UnitId) -> Result<Unit, StoreError> {
        (**self).find_unit(unit_id)
    }

    fn find_event_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Event>, StoreError> {
        (**self).find_event_by_fingerprint(fingerprint)
    }

    fn insert_event(&self, row: &NewEvent) -> Result<InsertOutcome, StoreError> {
        (**self).insert_event(row)
    }

    fn list_events_for_unit(&self, unit_id: &UnitId) -> Result<Vec<Event>, StoreError> {
        (**self).list_events_for_unit(unit_id)
    }

    fn register_unit(&self, unit: &Unit) -> Result<(), StoreError> {
        (**self).register_unit(unit)
    }

    fn ping(&self) -> Result<(), StoreError> {
        (**self).ping()
    }
}
