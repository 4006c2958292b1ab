// SPDX-License-Identifier: Apache-2.0

use floorline_core::Clock;
use floorline_model::{
    BlockerCandidate, BlockerSubmission, Event, EventCandidate, EventId, EventSubmission,
    NewEvent, Unit, UnitId, ValidationError,
};
use floorline_store::{InsertOutcome, Ledger, StoreError, StoreErrorCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bulk::BulkReport;
use crate::{Authenticator, IngestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestLimits {
    pub max_bulk_events: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_bulk_events: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitHistory {
    pub unit: Unit,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub event_id: EventId,
    pub duplicate: bool,
}

/// Records device events exactly once.
///
/// Every entry point authorizes before it touches the submission or the
/// ledger. Recording is a lookup by fingerprint followed by an insert; a
/// lost insert race is resolved by reading back the winner.
#[derive(Clone)]
pub struct IngestService {
    ledger: Arc<dyn Ledger>,
    authenticator: Arc<dyn Authenticator>,
    clock: Arc<dyn Clock>,
    limits: IngestLimits,
}

impl IngestService {
    #[must_use]
    pub fn new(
        ledger: Arc<dyn Ledger>,
        authenticator: Arc<dyn Authenticator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            authenticator,
            clock,
            limits: IngestLimits::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: IngestLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn limits(&self) -> IngestLimits {
        self.limits
    }

    #[must_use]
    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Checks a credential without doing any work. Lets transports reject a
    /// caller before reading the request body.
    pub fn authorize(&self, credential: Option<&str>) -> Result<(), IngestError> {
        self.authenticator.authorize(credential)
    }

    pub fn ingest(
        &self,
        credential: Option<&str>,
        submission: &EventSubmission,
    ) -> Result<IngestOutcome, IngestError> {
        self.authenticator.authorize(credential)?;
        let candidate = EventCandidate::validate(submission)?;
        self.record(candidate)
    }

    /// Blockers travel the same path as any other event, typed `blocker`.
    pub fn record_blocker(
        &self,
        credential: Option<&str>,
        submission: &BlockerSubmission,
    ) -> Result<IngestOutcome, IngestError> {
        self.authenticator.authorize(credential)?;
        let blocker = BlockerCandidate::validate(submission)?;
        self.record(blocker.into_event(self.clock.now()))
    }

    /// Ingests each element independently; one failure never aborts the rest.
    pub fn ingest_bulk(
        &self,
        credential: Option<&str>,
        items: &[serde_json::Value],
    ) -> Result<BulkReport, IngestError> {
        self.authenticator.authorize(credential)?;
        if items.is_empty() {
            return Err(ValidationError::single("events", "must contain at least one event").into());
        }
        if items.len() > self.limits.max_bulk_events {
            return Err(ValidationError::single(
                "events",
                format!("at most {} events per batch", self.limits.max_bulk_events),
            )
            .into());
        }
        let mut report = BulkReport::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let outcome = EventSubmission::from_json_value(item.clone())
                .and_then(|s| EventCandidate::validate(&s))
                .map_err(IngestError::from)
                .and_then(|candidate| self.record(candidate));
            report.push(index, outcome);
        }
        info!(
            total = items.len(),
            inserted = report.inserted,
            duplicates = report.duplicates,
            failed = report.errors.len(),
            "bulk ingestion finished"
        );
        Ok(report)
    }

    /// The unit and its events, oldest device time first.
    pub fn list_unit_events(
        &self,
        credential: Option<&str>,
        unit_id: &str,
    ) -> Result<UnitHistory, IngestError> {
        self.authenticator.authorize(credential)?;
        let unit_id = UnitId::parse(unit_id)
            .map_err(|e| ValidationError::single("unit_id", e.to_string()))?;
        let unit = self.ledger.find_unit(&unit_id)?;
        let events = self.ledger.list_events_for_unit(&unit.id)?;
        Ok(UnitHistory { unit, events })
    }

    fn record(&self, candidate: EventCandidate) -> Result<IngestOutcome, IngestError> {
        let fingerprint = candidate.fingerprint();
        if let Some(existing) = self.ledger.find_event_by_fingerprint(&fingerprint)? {
            debug!(
                unit_id = %existing.unit_id,
                fingerprint = %fingerprint,
                event_id = %existing.id,
                duplicate = true,
                "event already recorded"
            );
            return Ok(IngestOutcome {
                event_id: existing.id,
                duplicate: true,
            });
        }

        let unit = self.ledger.find_unit(&candidate.unit_id)?;
        let row = NewEvent::assemble(
            candidate,
            fingerprint.clone(),
            &unit,
            EventId::generate(),
            self.clock.now(),
        )?;
        match self.ledger.insert_event(&row)? {
            InsertOutcome::Inserted(event) => {
                info!(
                    unit_id = %event.unit_id,
                    stage = event.stage.as_str(),
                    event_type = event.event_type.as_str(),
                    fingerprint = %fingerprint,
                    event_id = %event.id,
                    duplicate = false,
                    "event recorded"
                );
                Ok(IngestOutcome {
                    event_id: event.id,
                    duplicate: false,
                })
            }
            InsertOutcome::Conflict => match self.ledger.find_event_by_fingerprint(&fingerprint)? {
                Some(winner) => {
                    info!(
                        unit_id = %winner.unit_id,
                        fingerprint = %fingerprint,
                        event_id = %winner.id,
                        duplicate = true,
                        "lost insert race; returning recorded event"
                    );
                    Ok(IngestOutcome {
                        event_id: winner.id,
                        duplicate: true,
                    })
                }
                None => {
                    warn!(fingerprint = %fingerprint, "conflict reported but no row is visible");
                    Err(IngestError::Storage(StoreError::new(
                        StoreErrorCode::Unavailable,
                        "idempotency conflict without a visible row",
                    )))
                }
            },
        }
    }
}
