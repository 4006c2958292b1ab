// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use floorline_core::time::parse_rfc3339_utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::FieldErrors;
use crate::{
    BlockerCode, EventPayload, EventType, Fingerprint, OrderId, Stage, UnitId, ValidationError,
    WorkstationId,
};

/// Upper bound, in characters, for free-text payload fields.
pub const MAX_TEXT_LEN: usize = 2000;

const NON_NEGATIVE: &str = "must be a non-negative integer";

/// Event as submitted by a device, before any checks.
///
/// Fields stay raw JSON so a value of the wrong type is reported against
/// its own field. Unknown fields are ignored: devices that still send an
/// `org_id` are accepted, and the value never reaches the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSubmission {
    #[serde(default)]
    pub unit_id: Option<Value>,
    #[serde(default)]
    pub order_id: Option<Value>,
    #[serde(default)]
    pub stage: Option<Value>,
    #[serde(default, rename = "type")]
    pub event_type: Option<Value>,
    #[serde(default)]
    pub workstation_id: Option<Value>,
    #[serde(default)]
    pub ts_device: Option<Value>,
    #[serde(default)]
    pub qty_good: Option<Value>,
    #[serde(default)]
    pub qty_defect: Option<Value>,
    #[serde(default)]
    pub defect_code: Option<Value>,
    #[serde(default)]
    pub rework: Option<Value>,
    #[serde(default)]
    pub blocker_code: Option<Value>,
    #[serde(default)]
    pub blocker_minutes: Option<Value>,
    #[serde(default)]
    pub carrier: Option<Value>,
    #[serde(default)]
    pub tracking_number: Option<Value>,
    #[serde(default)]
    pub annotation_text: Option<Value>,
}

impl EventSubmission {
    /// Decodes one element of a JSON batch. Anything but an object is a
    /// single field error on `body` so a batch can report it per index.
    pub fn from_json_value(value: Value) -> Result<Self, ValidationError> {
        if !value.is_object() {
            return Err(ValidationError::single("body", "must be a JSON object"));
        }
        serde_json::from_value(value).map_err(|e| ValidationError::single("body", e.to_string()))
    }
}

/// A submission that passed every boundary check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCandidate {
    pub unit_id: UnitId,
    /// Absent only for blockers, whose order is resolved from the unit.
    pub order_id: Option<OrderId>,
    pub stage: Stage,
    pub event_type: EventType,
    pub workstation_id: Option<WorkstationId>,
    pub ts_device: DateTime<Utc>,
    pub payload: EventPayload,
}

impl EventCandidate {
    /// Checks `submission`, collecting every offending field.
    pub fn validate(submission: &EventSubmission) -> Result<Self, ValidationError> {
        let mut errors = FieldErrors::default();

        let unit_id = required(&mut errors, "unit_id", submission.unit_id.as_ref())
            .and_then(|raw| errors.capture("unit_id", UnitId::parse(raw)));
        let order_id = required(&mut errors, "order_id", submission.order_id.as_ref())
            .and_then(|raw| errors.capture("order_id", OrderId::parse(raw)));
        let stage = required(&mut errors, "stage", submission.stage.as_ref())
            .and_then(|raw| errors.capture("stage", raw.parse::<Stage>()));
        let event_type = required(&mut errors, "type", submission.event_type.as_ref())
            .and_then(|raw| errors.capture("type", raw.parse::<EventType>()));
        let workstation_id =
            optional_str(&mut errors, "workstation_id", submission.workstation_id.as_ref())
                .and_then(|raw| errors.capture("workstation_id", WorkstationId::parse(raw)));
        let ts_device = required(&mut errors, "ts_device", submission.ts_device.as_ref())
            .and_then(|raw| parse_instant(&mut errors, "ts_device", raw));

        let qty_good = non_negative(&mut errors, "qty_good", submission.qty_good.as_ref());
        let qty_defect = non_negative(&mut errors, "qty_defect", submission.qty_defect.as_ref());
        let rework = flag(&mut errors, "rework", submission.rework.as_ref());
        let blocker_minutes =
            non_negative(&mut errors, "blocker_minutes", submission.blocker_minutes.as_ref());
        let blocker_code =
            optional_str(&mut errors, "blocker_code", submission.blocker_code.as_ref())
                .and_then(|raw| errors.capture("blocker_code", raw.parse::<BlockerCode>()));
        if event_type == Some(EventType::Blocker) && is_absent(submission.blocker_code.as_ref()) {
            errors.push("blocker_code", "is required for blocker events");
        }

        let defect_code = text(&mut errors, "defect_code", submission.defect_code.as_ref());
        let carrier = text(&mut errors, "carrier", submission.carrier.as_ref());
        let tracking_number =
            text(&mut errors, "tracking_number", submission.tracking_number.as_ref());
        let annotation_text =
            text(&mut errors, "annotation_text", submission.annotation_text.as_ref());

        errors.into_result()?;
        match (unit_id, order_id, stage, event_type, ts_device) {
            (Some(unit_id), Some(order_id), Some(stage), Some(event_type), Some(ts_device)) => {
                Ok(Self {
                    unit_id,
                    order_id: Some(order_id),
                    stage,
                    event_type,
                    workstation_id,
                    ts_device,
                    payload: EventPayload {
                        qty_good: qty_good.unwrap_or(0),
                        qty_defect: qty_defect.unwrap_or(0),
                        defect_code,
                        // rework_* types are rework whatever the flag says
                        rework: rework.unwrap_or(false) || event_type.is_rework(),
                        blocker_code,
                        blocker_minutes,
                        carrier,
                        tracking_number,
                        annotation_text,
                    },
                })
            }
            _ => Err(ValidationError::single("body", "incomplete event")),
        }
    }

    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(&self.unit_id, self.stage, self.event_type, &self.ts_device)
    }
}

/// Blocker report as submitted by a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockerSubmission {
    #[serde(default)]
    pub unit_id: Option<Value>,
    #[serde(default)]
    pub stage: Option<Value>,
    #[serde(default)]
    pub blocker_code: Option<Value>,
    #[serde(default)]
    pub blocker_minutes: Option<Value>,
    #[serde(default)]
    pub ts_device: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockerCandidate {
    pub unit_id: UnitId,
    pub stage: Stage,
    pub blocker_code: BlockerCode,
    pub blocker_minutes: u32,
    pub ts_device: Option<DateTime<Utc>>,
}

impl BlockerCandidate {
    pub fn validate(submission: &BlockerSubmission) -> Result<Self, ValidationError> {
        let mut errors = FieldErrors::default();
        let unit_id = required(&mut errors, "unit_id", submission.unit_id.as_ref())
            .and_then(|raw| errors.capture("unit_id", UnitId::parse(raw)));
        let stage = required(&mut errors, "stage", submission.stage.as_ref())
            .and_then(|raw| errors.capture("stage", raw.parse::<Stage>()));
        let blocker_code = required(&mut errors, "blocker_code", submission.blocker_code.as_ref())
            .and_then(|raw| errors.capture("blocker_code", raw.parse::<BlockerCode>()));
        let blocker_minutes = if is_absent(submission.blocker_minutes.as_ref()) {
            errors.push("blocker_minutes", "is required");
            None
        } else {
            non_negative(&mut errors, "blocker_minutes", submission.blocker_minutes.as_ref())
        };
        let ts_device = optional_str(&mut errors, "ts_device", submission.ts_device.as_ref())
            .and_then(|raw| parse_instant(&mut errors, "ts_device", raw));

        errors.into_result()?;
        match (unit_id, stage, blocker_code, blocker_minutes) {
            (Some(unit_id), Some(stage), Some(blocker_code), Some(blocker_minutes)) => Ok(Self {
                unit_id,
                stage,
                blocker_code,
                blocker_minutes,
                ts_device,
            }),
            _ => Err(ValidationError::single("body", "incomplete blocker")),
        }
    }

    /// Turns the blocker into a regular `blocker` event. `now` stands in for
    /// a device timestamp the client did not send.
    #[must_use]
    pub fn into_event(self, now: DateTime<Utc>) -> EventCandidate {
        EventCandidate {
            unit_id: self.unit_id,
            order_id: None,
            stage: self.stage,
            event_type: EventType::Blocker,
            workstation_id: None,
            ts_device: self.ts_device.unwrap_or(now),
            payload: EventPayload {
                blocker_code: Some(self.blocker_code),
                blocker_minutes: Some(self.blocker_minutes),
                ..EventPayload::default()
            },
        }
    }
}

/// `null` counts as absent.
fn is_absent(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_null)
}

fn optional_str<'a>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&'a Value>,
) -> Option<&'a str> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.as_str()),
        _ => {
            errors.push(field, "must be a string");
            None
        }
    }
}

fn required<'a>(errors: &mut FieldErrors, field: &str, value: Option<&'a Value>) -> Option<&'a str> {
    if is_absent(value) {
        errors.push(field, "is required");
        return None;
    }
    match optional_str(errors, field, value) {
        Some(v) if v.trim().is_empty() => {
            errors.push(field, "is required");
            None
        }
        other => other,
    }
}

fn parse_instant(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<DateTime<Utc>> {
    match parse_rfc3339_utc(raw) {
        Ok(ts) => Some(ts),
        Err(_) => {
            errors.push(field, "must be an RFC 3339 timestamp");
            None
        }
    }
}

/// Integral JSON numbers, including floats such as `3.0`, that fit a `u32`.
fn non_negative(errors: &mut FieldErrors, field: &str, value: Option<&Value>) -> Option<u32> {
    let parsed = match value? {
        Value::Null => return None,
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u64)
        }),
        _ => None,
    };
    match parsed.and_then(|v| u32::try_from(v).ok()) {
        Some(v) => Some(v),
        None => {
            errors.push(field, NON_NEGATIVE);
            None
        }
    }
}

fn flag(errors: &mut FieldErrors, field: &str, value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        _ => {
            errors.push(field, "must be a boolean");
            None
        }
    }
}

fn text(errors: &mut FieldErrors, field: &str, value: Option<&Value>) -> Option<String> {
    let v = optional_str(errors, field, value)?;
    if v.chars().count() > MAX_TEXT_LEN {
        errors.push(field, format!("must be at most {MAX_TEXT_LEN} characters"));
        return None;
    }
    Some(v.to_string())
}
