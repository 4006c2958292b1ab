// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use floorline_core::sha256_hex;
use floorline_core::time::epoch_seconds_floor;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{EventType, Stage, UnitId, ValidationError};

pub const FINGERPRINT_SEPARATOR: char = '-';
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Idempotency key of an event: SHA-256 over
/// `{unit_id}-{stage}-{type}-{epoch_seconds}`, lowercase hex.
///
/// The device timestamp is floored to whole seconds, so a double tap or a
/// client retry inside the same second maps to the same key while actions a
/// second or more apart stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    #[must_use]
    pub fn compute(
        unit_id: &UnitId,
        stage: Stage,
        event_type: EventType,
        ts_device: &DateTime<Utc>,
    ) -> Self {
        let material = Self::material(unit_id, stage, event_type, ts_device);
        Self(sha256_hex(material.as_bytes()))
    }

    /// Pre-image fed to the hash. Exposed for diagnostics and tests.
    #[must_use]
    pub fn material(
        unit_id: &UnitId,
        stage: Stage,
        event_type: EventType,
        ts_device: &DateTime<Utc>,
    ) -> String {
        let sep = FINGERPRINT_SEPARATOR;
        format!(
            "{unit_id}{sep}{}{sep}{}{sep}{}",
            stage.as_str(),
            event_type.as_str(),
            epoch_seconds_floor(ts_device)
        )
    }

    /// Accepts a stored key; used when reading rows back from a ledger.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.len() != FINGERPRINT_HEX_LEN
            || !input
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(ValidationError::single(
                "idempotency_key",
                "must be 64 lowercase hex characters",
            ));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorline_core::time::parse_rfc3339_utc;

    fn unit() -> UnitId {
        UnitId::parse("6f1c2b9a-0d4e-4f7a-8b3c-2e1d0c9b8a70").expect("unit")
    }

    #[test]
    fn material_uses_dash_separator_and_epoch_seconds() {
        let ts = parse_rfc3339_utc("2024-03-01T10:00:05.250Z").expect("ts");
        assert_eq!(
            Fingerprint::material(&unit(), Stage::Pack, EventType::StageStart, &ts),
            "6f1c2b9a-0d4e-4f7a-8b3c-2e1d0c9b8a70-pack-stage_start-1709287205"
        );
    }

    #[test]
    fn same_second_collapses_and_next_second_splits() {
        let t0 = parse_rfc3339_utc("2024-03-01T10:00:05.000Z").expect("t0");
        let t400 = parse_rfc3339_utc("2024-03-01T10:00:05.400Z").expect("t400");
        let t1200 = parse_rfc3339_utc("2024-03-01T10:00:06.200Z").expect("t1200");
        let a = Fingerprint::compute(&unit(), Stage::Pack, EventType::StageStart, &t0);
        let b = Fingerprint::compute(&unit(), Stage::Pack, EventType::StageStart, &t400);
        let c = Fingerprint::compute(&unit(), Stage::Pack, EventType::StageStart, &t1200);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn close_instants_across_a_boundary_differ() {
        let before = parse_rfc3339_utc("2024-03-01T10:00:05.900Z").expect("before");
        let after = parse_rfc3339_utc("2024-03-01T10:00:06.100Z").expect("after");
        assert_ne!(
            Fingerprint::compute(&unit(), Stage::Ship, EventType::StageComplete, &before),
            Fingerprint::compute(&unit(), Stage::Ship, EventType::StageComplete, &after)
        );
    }

    #[test]
    fn compute_output_is_parseable_hex() {
        let ts = parse_rfc3339_utc("2024-03-01T10:00:05Z").expect("ts");
        let fp = Fingerprint::compute(&unit(), Stage::BeadPrep, EventType::Blocker, &ts);
        assert_eq!(fp.as_str().len(), FINGERPRINT_HEX_LEN);
        assert_eq!(Fingerprint::parse(fp.as_str()).expect("parse"), fp);
        assert!(Fingerprint::parse("ABC").is_err());
    }
}
