// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, SecondsFormat, Utc};

/// Whole epoch seconds of `instant`, discarding the sub-second part.
///
/// Flooring (not rounding toward zero) keeps pre-epoch instants in the second
/// they actually fall in.
#[must_use]
pub fn epoch_seconds_floor(instant: &DateTime<Utc>) -> i64 {
    instant.timestamp()
}

pub fn parse_rfc3339_utc(input: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(input.trim()).map(|t| t.with_timezone(&Utc))
}

#[must_use]
pub fn format_rfc3339_millis(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_discards_subsecond_precision() {
        let t = parse_rfc3339_utc("2024-03-01T10:00:05.999Z").expect("ts");
        assert_eq!(epoch_seconds_floor(&t), 1_709_287_205);
    }

    #[test]
    fn floor_rounds_pre_epoch_instants_down() {
        let t = parse_rfc3339_utc("1969-12-31T23:59:59.500Z").expect("ts");
        assert_eq!(epoch_seconds_floor(&t), -1);
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let a = parse_rfc3339_utc("2024-03-01T12:00:00+02:00").expect("a");
        let b = parse_rfc3339_utc("2024-03-01T10:00:00Z").expect("b");
        assert_eq!(a, b);
    }
}
