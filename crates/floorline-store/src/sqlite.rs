// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, SecondsFormat, Utc};
use floorline_core::time::parse_rfc3339_utc;
use floorline_model::{
    BlockerCode, Event, EventId, EventPayload, EventType, Fingerprint, NewEvent, OrderId, OrgId,
    Stage, Unit, UnitId, WorkstationId,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use crate::{InsertOutcome, Ledger, StoreError, StoreErrorCode};

pub const LEDGER_SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS units (
  id TEXT PRIMARY KEY,
  org_id TEXT NOT NULL,
  order_id TEXT NOT NULL,
  unit_number INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS events (
  id TEXT PRIMARY KEY,
  idempotency_key TEXT NOT NULL,
  unit_id TEXT NOT NULL REFERENCES units(id),
  order_id TEXT NOT NULL,
  org_id TEXT NOT NULL,
  stage TEXT NOT NULL,
  type TEXT NOT NULL,
  workstation_id TEXT,
  ts_device TEXT NOT NULL,
  ts_server TEXT NOT NULL,
  qty_good INTEGER NOT NULL DEFAULT 0,
  qty_defect INTEGER NOT NULL DEFAULT 0,
  defect_code TEXT,
  rework INTEGER NOT NULL DEFAULT 0,
  blocker_code TEXT,
  blocker_minutes INTEGER,
  carrier TEXT,
  tracking_number TEXT,
  annotation_text TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS events_idempotency_key ON events(idempotency_key);
CREATE INDEX IF NOT EXISTS events_unit_timeline ON events(unit_id, ts_device, ts_server, id);
CREATE TRIGGER IF NOT EXISTS events_no_update BEFORE UPDATE ON events
BEGIN SELECT RAISE(ABORT, 'events are append-only'); END;
CREATE TRIGGER IF NOT EXISTS events_no_delete BEFORE DELETE ON events
BEGIN SELECT RAISE(ABORT, 'events are append-only'); END;
";

const EVENT_COLUMNS: &str = "id, idempotency_key, unit_id, order_id, org_id, stage, type, \
    workstation_id, ts_device, ts_server, qty_good, qty_defect, defect_code, rework, \
    blocker_code, blocker_minutes, carrier, tracking_number, annotation_text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
    pub max_idle_connections: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("floorline.sqlite"),
            busy_timeout: Duration::from_millis(5_000),
            max_idle_connections: 8,
        }
    }
}

/// Durable ledger on a SQLite file in WAL mode.
///
/// Connections are pooled so concurrent callers hit the database in
/// parallel and the unique index, not a process lock, arbitrates races.
pub struct SqliteLedger {
    config: LedgerConfig,
    idle: Mutex<Vec<Connection>>,
}

impl SqliteLedger {
    /// Opens (creating if needed) the ledger and brings the schema up to date.
    pub fn open(config: LedgerConfig) -> Result<Self, StoreError> {
        let conn = open_connection(&config.db_path, config.busy_timeout)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrate(&conn)?;
        info!(path = %config.db_path.display(), "ledger opened");
        Ok(Self {
            config,
            idle: Mutex::new(vec![conn]),
        })
    }

    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open(LedgerConfig {
            db_path: path.as_ref().to_path_buf(),
            ..LedgerConfig::default()
        })
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let pooled = self.idle.lock().map_err(|_| StoreError::poisoned())?.pop();
        let conn = match pooled {
            Some(conn) => conn,
            None => open_connection(&self.config.db_path, self.config.busy_timeout)?,
        };
        let out = f(&conn);
        let mut idle = self.idle.lock().map_err(|_| StoreError::poisoned())?;
        if idle.len() < self.config.max_idle_connections {
            idle.push(conn);
        }
        out
    }
}

fn open_connection(path: &Path, busy_timeout: Duration) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

fn migrate(conn: &Connection) -> Result<(), StoreError> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    match version {
        0 => {
            conn.execute_batch(SCHEMA_V1)?;
            conn.pragma_update(None, "user_version", LEDGER_SCHEMA_VERSION)?;
            debug!(version = LEDGER_SCHEMA_VERSION, "ledger schema created");
            Ok(())
        }
        LEDGER_SCHEMA_VERSION => Ok(()),
        other => Err(StoreError::new(
            StoreErrorCode::Unsupported,
            format!("ledger schema version {other} is newer than supported {LEDGER_SCHEMA_VERSION}"),
        )),
    }
}

fn ts_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn corrupt(column: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::new(
        StoreErrorCode::Corrupt,
        format!("column `{column}`: {detail}"),
    )
}

fn text_column<T, E: std::fmt::Display>(
    column: &str,
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, StoreError> {
    parse(raw).map_err(|e| corrupt(column, e))
}

/// Column values as SQLite returns them, before domain parsing.
struct RawEvent {
    id: String,
    idempotency_key: String,
    unit_id: String,
    order_id: String,
    org_id: String,
    stage: String,
    event_type: String,
    workstation_id: Option<String>,
    ts_device: String,
    ts_server: String,
    qty_good: i64,
    qty_defect: i64,
    defect_code: Option<String>,
    rework: bool,
    blocker_code: Option<String>,
    blocker_minutes: Option<i64>,
    carrier: Option<String>,
    tracking_number: Option<String>,
    annotation_text: Option<String>,
}

impl RawEvent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            idempotency_key: row.get(1)?,
            unit_id: row.get(2)?,
            order_id: row.get(3)?,
            org_id: row.get(4)?,
            stage: row.get(5)?,
            event_type: row.get(6)?,
            workstation_id: row.get(7)?,
            ts_device: row.get(8)?,
            ts_server: row.get(9)?,
            qty_good: row.get(10)?,
            qty_defect: row.get(11)?,
            defect_code: row.get(12)?,
            rework: row.get(13)?,
            blocker_code: row.get(14)?,
            blocker_minutes: row.get(15)?,
            carrier: row.get(16)?,
            tracking_number: row.get(17)?,
            annotation_text: row.get(18)?,
        })
    }

    fn into_event(self) -> Result<Event, StoreError> {
        let count = |column: &str, v: i64| u32::try_from(v).map_err(|e| corrupt(column, e));
        Ok(Event {
            id: text_column("id", &self.id, EventId::parse)?,
            idempotency_key: text_column("idempotency_key", &self.idempotency_key, Fingerprint::parse)?,
            unit_id: text_column("unit_id", &self.unit_id, UnitId::parse)?,
            order_id: text_column("order_id", &self.order_id, OrderId::parse)?,
            org_id: text_column("org_id", &self.org_id, OrgId::parse)?,
            stage: text_column("stage", &self.stage, str::parse::<Stage>)?,
            event_type: text_column("type", &self.event_type, str::parse::<EventType>)?,
            workstation_id: self
                .workstation_id
                .as_deref()
                .map(|raw| text_column("workstation_id", raw, WorkstationId::parse))
                .transpose()?,
            ts_device: text_column("ts_device", &self.ts_device, parse_rfc3339_utc)?,
            ts_server: text_column("ts_server", &self.ts_server, parse_rfc3339_utc)?,
            payload: EventPayload {
                qty_good: count("qty_good", self.qty_good)?,
                qty_defect: count("qty_defect", self.qty_defect)?,
                defect_code: self.defect_code,
                rework: self.rework,
                blocker_code: self
                    .blocker_code
                    .as_deref()
                    .map(|raw| text_column("blocker_code", raw, str::parse::<BlockerCode>))
                    .transpose()?,
                blocker_minutes: self
                    .blocker_minutes
                    .map(|v| count("blocker_minutes", v))
                    .transpose()?,
                carrier: self.carrier,
                tracking_number: self.tracking_number,
                annotation_text: self.annotation_text,
            },
        })
    }
}

impl Ledger for SqliteLedger {
    fn find_unit(&self, unit_id: &UnitId) -> Result<Unit, StoreError> {
        self.with_connection(|conn| {
            let raw: Option<(String, String, i64)> = conn
                .query_row(
                    "SELECT org_id, order_id, unit_number FROM units WHERE id = ?1",
                    params![unit_id.to_string()],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
                )
                .optional()?;
            let (org_id, order_id, unit_number) = raw.ok_or_else(|| {
                StoreError::new(StoreErrorCode::NotFound, format!("unit {unit_id} not found"))
            })?;
            Ok(Unit {
                id: *unit_id,
                org_id: text_column("org_id", &org_id, OrgId::parse)?,
                order_id: text_column("order_id", &order_id, OrderId::parse)?,
                unit_number: u32::try_from(unit_number).map_err(|e| corrupt("unit_number", e))?,
            })
        })
    }

    fn find_event_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Event>, StoreError> {
        self.with_connection(|conn| {
            let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE idempotency_key = ?1");
            conn.query_row(&sql, params![fingerprint.as_str()], RawEvent::from_row)
                .optional()?
                .map(RawEvent::into_event)
                .transpose()
        })
    }

    fn insert_event(&self, row: &NewEvent) -> Result<InsertOutcome, StoreError> {
        self.with_connection(|conn| {
            let sql = format!(
                "INSERT INTO events ({EVENT_COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
            );
            let p = &row.payload;
            let result = conn.execute(
                &sql,
                params![
                    row.id.to_string(),
                    row.idempotency_key.as_str(),
                    row.unit_id.to_string(),
                    row.order_id.to_string(),
                    row.org_id.to_string(),
                    row.stage.as_str(),
                    row.event_type.as_str(),
                    row.workstation_id.map(|w| w.to_string()),
                    ts_text(&row.ts_device),
                    ts_text(&row.ts_server),
                    i64::from(p.qty_good),
                    i64::from(p.qty_defect),
                    p.defect_code.as_deref(),
                    p.rework,
                    p.blocker_code.map(BlockerCode::as_str),
                    p.blocker_minutes.map(i64::from),
                    p.carrier.as_deref(),
                    p.tracking_number.as_deref(),
                    p.annotation_text.as_deref(),
                ],
            );
            match result {
                Ok(_) => Ok(InsertOutcome::Inserted(row.clone().into_event())),
                Err(e) => {
                    let err = StoreError::from(e);
                    match err.code {
                        StoreErrorCode::Conflict => Ok(InsertOutcome::Conflict),
                        StoreErrorCode::NotFound => Err(StoreError::new(
                            StoreErrorCode::NotFound,
                            format!("unit {} not registered", row.unit_id),
                        )),
                        _ => Err(err),
                    }
                }
            }
        })
    }

    fn list_events_for_unit(&self, unit_id: &UnitId) -> Result<Vec<Event>, StoreError> {
        self.with_connection(|conn| {
            let sql = format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE unit_id = ?1 \
                 ORDER BY ts_device, ts_server, id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![unit_id.to_string()], RawEvent::from_row)?;
            let mut out = Vec::new();
            for raw in rows {
                out.push(raw?.into_event()?);
            }
            Ok(out)
        })
    }

    fn register_unit(&self, unit: &Unit) -> Result<(), StoreError> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO units (id, org_id, order_id, unit_number) VALUES (?1, ?2, ?3, ?4)",
                params![
                    unit.id.to_string(),
                    unit.org_id.to_string(),
                    unit.order_id.to_string(),
                    i64::from(unit.unit_number),
                ],
            )
            .map_err(|e| {
                let err = StoreError::from(e);
                if err.code == StoreErrorCode::Conflict {
                    StoreError::new(StoreErrorCode::Conflict, format!("unit {} already registered", unit.id))
                } else {
                    err
                }
            })?;
            Ok(())
        })
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.with_connection(|conn| {
            let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
            if version == LEDGER_SCHEMA_VERSION {
                Ok(())
            } else {
                Err(StoreError::new(
                    StoreErrorCode::Unavailable,
                    format!("ledger schema version {version}, expected {LEDGER_SCHEMA_VERSION}"),
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanosecond_timestamps_sort_lexically() {
        let a = parse_rfc3339_utc("2024-03-01T10:00:05.000000001Z").expect("a");
        let b = parse_rfc3339_utc("2024-03-01T10:00:05.1Z").expect("b");
        assert!(ts_text(&a) < ts_text(&b));
        assert_eq!(ts_text(&b), "2024-03-01T10:00:05.100000000Z");
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ledger.sqlite");
        let conn = Connection::open(&path).expect("open");
        conn.pragma_update(None, "user_version", 9).expect("pragma");
        drop(conn);
        let err = match SqliteLedger::open_path(&path) {
            Ok(_) => panic!("newer schema accepted"),
            Err(e) => e,
        };
        assert_eq!(err.code, StoreErrorCode::Unsupported);
    }
}
