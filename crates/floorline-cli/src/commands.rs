// SPDX-License-Identifier: Apache-2.0

use crate::{CliError, OutputMode, ENV_FLOORLINE_API_TOKENS};
use floorline_core::{time::format_rfc3339_millis, SystemClock};
use floorline_ingest::{BulkItemError, IngestService, StaticTokenAuthenticator, UnitHistory};
use floorline_model::{FieldError, OrderId, OrgId, Unit, UnitId, ValidationError};
use floorline_store::{Ledger, SqliteLedger, LEDGER_SCHEMA_VERSION};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Credential presented in local operator mode when `--token` is omitted.
const LOCAL_OPERATOR_TOKEN: &str = "floorline-cli";

pub(crate) struct UnitArgs {
    pub unit_id: String,
    pub order_id: String,
    pub org_id: String,
    pub unit_number: u32,
}

#[derive(Debug, Default, Serialize)]
struct ReplaySummary {
    file: String,
    total: usize,
    batches: usize,
    inserted: usize,
    duplicates: usize,
    errors: Vec<BulkItemError>,
}

pub(crate) fn run_init(db: &Path, output_mode: OutputMode) -> Result<(), CliError> {
    let ledger = SqliteLedger::open_path(db)?;
    ledger.ping()?;
    info!(db = %db.display(), "ledger initialized");
    if output_mode.json {
        print_json(&json!({
            "db": db.display().to_string(),
            "schema_version": LEDGER_SCHEMA_VERSION,
        }))
    } else {
        println!(
            "ledger ready: {} (schema v{LEDGER_SCHEMA_VERSION})",
            db.display()
        );
        Ok(())
    }
}

pub(crate) fn run_register_unit(
    db: &Path,
    args: &UnitArgs,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let unit = parse_unit(args).map_err(|e| {
        let mut err = CliError::validation(&e.to_string());
        for field in &e.field_errors {
            err.machine = err.machine.with_detail(&field.field, &field.reason);
        }
        err
    })?;
    let ledger = SqliteLedger::open_path(db)?;
    ledger.register_unit(&unit)?;
    info!(unit_id = %unit.id, order_id = %unit.order_id, "unit registered");
    if output_mode.json {
        print_json(&unit)
    } else {
        println!("registered unit {} (#{})", unit.id, unit.unit_number);
        Ok(())
    }
}

fn parse_unit(args: &UnitArgs) -> Result<Unit, ValidationError> {
    let mut errors = Vec::new();
    let unit_id = UnitId::parse(&args.unit_id)
        .map_err(|e| errors.push(("unit_id", e.to_string())))
        .ok();
    let order_id = OrderId::parse(&args.order_id)
        .map_err(|e| errors.push(("order_id", e.to_string())))
        .ok();
    let org_id = OrgId::parse(&args.org_id)
        .map_err(|e| errors.push(("org_id", e.to_string())))
        .ok();
    match (unit_id, order_id, org_id) {
        (Some(id), Some(order_id), Some(org_id)) => Ok(Unit {
            id,
            org_id,
            order_id,
            unit_number: args.unit_number,
        }),
        _ => {
            let field_errors = errors
                .into_iter()
                .map(|(field, reason)| FieldError::new(field, reason))
                .collect();
            Err(ValidationError { field_errors })
        }
    }
}

pub(crate) fn run_replay(
    db: &Path,
    file: &Path,
    token: Option<&str>,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let raw = fs::read_to_string(file)
        .map_err(|e| CliError::input(format!("read {} failed: {e}", file.display())))?;
    let items = replay_items(&raw)
        .map_err(|e| CliError::input(format!("{}: {e}", file.display())))?;
    let (service, credential) = operator_service(db, token)?;
    service.authorize(Some(credential))?;

    let mut summary = ReplaySummary {
        file: file.display().to_string(),
        total: items.len(),
        ..ReplaySummary::default()
    };
    let batch_size = service.limits().max_bulk_events.max(1);
    for (batch_no, batch) in items.chunks(batch_size).enumerate() {
        let offset = batch_no * batch_size;
        let report = service.ingest_bulk(Some(credential), batch)?;
        summary.batches += 1;
        summary.inserted += report.inserted;
        summary.duplicates += report.duplicates;
        summary
            .errors
            .extend(report.errors.into_iter().map(|mut e| {
                e.index += offset;
                e
            }));
    }
    info!(
        file = %summary.file,
        total = summary.total,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        failed = summary.errors.len(),
        "replay finished"
    );

    if output_mode.json {
        print_json(&summary)?;
    } else {
        println!(
            "replayed {} events from {}: {} inserted, {} duplicates, {} rejected",
            summary.total,
            summary.file,
            summary.inserted,
            summary.duplicates,
            summary.errors.len()
        );
        for err in &summary.errors {
            println!("  [{}] {}: {}", err.index, err.code.as_str(), err.message);
        }
    }
    if summary.errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::validation(&format!(
            "{} of {} events rejected",
            summary.errors.len(),
            summary.total
        )))
    }
}

/// Accepts either a bare JSON array or `{"events": [...]}`.
fn replay_items(raw: &str) -> Result<Vec<Value>, String> {
    match serde_json::from_str::<Value>(raw).map_err(|e| format!("invalid JSON: {e}"))? {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err("expected an `events` array".to_string()),
        },
        _ => Err("expected a JSON array of events".to_string()),
    }
}

pub(crate) fn run_events(
    db: &Path,
    unit_id: &str,
    token: Option<&str>,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let (service, credential) = operator_service(db, token)?;
    let UnitHistory { unit, events } = service.list_unit_events(Some(credential), unit_id)?;
    if output_mode.json {
        return print_json(&json!({ "unit": unit, "events": events }));
    }
    println!(
        "unit {} (#{}) order {} org {}: {} events",
        unit.id,
        unit.unit_number,
        unit.order_id,
        unit.org_id,
        events.len()
    );
    for event in &events {
        println!(
            "  {}  {:<14} {:<20} {}",
            format_rfc3339_millis(&event.ts_device),
            event.stage.as_str(),
            event.event_type.as_str(),
            event.id
        );
    }
    Ok(())
}

/// With `FLOORLINE_API_TOKENS` set, `--token` must be one of them. Without
/// it any non-empty token passes and a fixed operator token is the default.
fn operator_service<'a>(
    db: &Path,
    token: Option<&'a str>,
) -> Result<(IngestService, &'a str), CliError> {
    let allowed: Vec<String> = std::env::var(ENV_FLOORLINE_API_TOKENS)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect();
    let authenticator = if allowed.is_empty() {
        StaticTokenAuthenticator::accept_any()
    } else {
        StaticTokenAuthenticator::new(allowed)
    };
    let ledger = SqliteLedger::open_path(db)?;
    let service = IngestService::new(
        Arc::new(ledger),
        Arc::new(authenticator),
        Arc::new(SystemClock),
    );
    Ok((service, token.unwrap_or(LOCAL_OPERATOR_TOKEN)))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::internal(format!("encode output failed: {e}")))?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_accepts_array_or_envelope() {
        assert_eq!(replay_items("[{}, {}]").expect("array").len(), 2);
        assert_eq!(
            replay_items(r#"{"events": [{}]}"#).expect("envelope").len(),
            1
        );
        assert!(replay_items(r#"{"items": []}"#).is_err());
        assert!(replay_items("42").is_err());
        assert!(replay_items("[").is_err());
    }

    #[test]
    fn parse_unit_reports_every_bad_id() {
        let err = parse_unit(&UnitArgs {
            unit_id: "nope".into(),
            order_id: "8c2d8f8e-9a51-4a0b-9d55-3f1d0f2a7b10".into(),
            org_id: "also-nope".into(),
            unit_number: 1,
        })
        .expect_err("bad ids");
        assert_eq!(err.fields(), vec!["unit_id", "org_id"]);
    }
}
