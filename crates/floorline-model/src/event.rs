// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    BlockerCode, EventCandidate, EventId, EventType, Fingerprint, OrderId, OrgId, Stage, UnitId,
    ValidationError, WorkstationId,
};

/// Optional facts attached to an event. Quantities default to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub qty_good: u32,
    #[serde(default)]
    pub qty_defect: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defect_code: Option<String>,
    #[serde(default)]
    pub rework: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocker_code: Option<BlockerCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocker_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_text: Option<String>,
}

/// A unit resolved from the ledger: the source of truth for order and organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Unit {
    pub id: UnitId,
    pub org_id: OrgId,
    pub order_id: OrderId,
    pub unit_number: u32,
}

/// A recorded event. Rows are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub idempotency_key: Fingerprint,
    pub unit_id: UnitId,
    pub order_id: OrderId,
    pub org_id: OrgId,
    pub stage: Stage,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workstation_id: Option<WorkstationId>,
    pub ts_device: DateTime<Utc>,
    pub ts_server: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

/// Row handed to the ledger for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub id: EventId,
    pub idempotency_key: Fingerprint,
    pub unit_id: UnitId,
    pub order_id: OrderId,
    pub org_id: OrgId,
    pub stage: Stage,
    pub event_type: EventType,
    pub workstation_id: Option<WorkstationId>,
    pub ts_device: DateTime<Utc>,
    pub ts_server: DateTime<Utc>,
    pub payload: EventPayload,
}

impl NewEvent {
    /// Binds a candidate to its resolved unit.
    ///
    /// Order and organization come from `unit`. A client-supplied order that
    /// names a different order is rejected rather than silently replaced.
    pub fn assemble(
        candidate: EventCandidate,
        fingerprint: Fingerprint,
        unit: &Unit,
        id: EventId,
        ts_server: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if candidate.unit_id != unit.id {
            return Err(ValidationError::single("unit_id", "does not match resolved unit"));
        }
        if let Some(order_id) = candidate.order_id {
            if order_id != unit.order_id {
                return Err(ValidationError::single(
                    "order_id",
                    "does not match the unit's order",
                ));
            }
        }
        Ok(Self {
            id,
            idempotency_key: fingerprint,
            unit_id: unit.id,
            order_id: unit.order_id,
            org_id: unit.org_id,
            stage: candidate.stage,
            event_type: candidate.event_type,
            workstation_id: candidate.workstation_id,
            ts_device: candidate.ts_device,
            ts_server,
            payload: candidate.payload,
        })
    }

    #[must_use]
    pub fn into_event(self) -> Event {
        Event {
            id: self.id,
            idempotency_key: self.idempotency_key,
            unit_id: self.unit_id,
            order_id: self.order_id,
            org_id: self.org_id,
            stage: self.stage,
            event_type: self.event_type,
            workstation_id: self.workstation_id,
            ts_device: self.ts_device,
            ts_server: self.ts_server,
            payload: self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorline_core::time::parse_rfc3339_utc;
    use uuid::Uuid;

    fn unit() -> Unit {
        Unit {
            id: UnitId::from_uuid(Uuid::from_u128(1)),
            org_id: OrgId::from_uuid(Uuid::from_u128(2)),
            order_id: OrderId::from_uuid(Uuid::from_u128(3)),
            unit_number: 1,
        }
    }

    fn candidate(order: Option<OrderId>) -> EventCandidate {
        EventCandidate {
            unit_id: UnitId::from_uuid(Uuid::from_u128(1)),
            order_id: order,
            stage: Stage::InsertBeads,
            event_type: EventType::StageStart,
            workstation_id: None,
            ts_device: parse_rfc3339_utc("2024-03-01T10:00:05Z").expect("ts"),
            payload: EventPayload::default(),
        }
    }

    #[test]
    fn org_and_order_come_from_the_unit() {
        let c = candidate(None);
        let fp = c.fingerprint();
        let now = parse_rfc3339_utc("2024-03-01T10:00:07Z").expect("now");
        let row = NewEvent::assemble(c, fp, &unit(), EventId::generate(), now).expect("row");
        assert_eq!(row.org_id, unit().org_id);
        assert_eq!(row.order_id, unit().order_id);
        assert_eq!(row.ts_server, now);
    }

    #[test]
    fn mismatched_order_is_rejected() {
        let c = candidate(Some(OrderId::from_uuid(Uuid::from_u128(99))));
        let fp = c.fingerprint();
        let err = NewEvent::assemble(c, fp, &unit(), EventId::generate(), chrono::Utc::now())
            .expect_err("mismatch");
        assert_eq!(err.fields(), vec!["order_id"]);
    }

    #[test]
    fn event_json_is_flat_and_uses_type_key() {
        let c = candidate(None);
        let fp = c.fingerprint();
        let event = NewEvent::assemble(c, fp, &unit(), EventId::generate(), chrono::Utc::now())
            .expect("row")
            .into_event();
        let value = serde_json::to_value(&event).expect("json");
        assert_eq!(value["type"], "stage_start");
        assert_eq!(value["stage"], "insert_beads");
        assert_eq!(value["qty_good"], 0);
        assert!(value.get("blocker_code").is_none());
        let back: Event = serde_json::from_value(value).expect("decode");
        assert_eq!(back, event);
    }
}
