// SPDX-License-Identifier: Apache-2.0

mod http_support;

use std::io;
use std::sync::{Arc, Mutex};

use floorline_model::EventSubmission;
use floorline_server::ApiConfig;
use http_support::{seeded_ledger, state_with, TOKEN, UNIT};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn json_lines(sink: &SharedBuffer) -> Vec<serde_json::Value> {
    let bytes = sink.0.lock().expect("lock output").clone();
    let text = String::from_utf8(bytes).expect("utf8 log output");
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("json log line"))
        .collect()
}

#[test]
fn audit_line_is_structured_json() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(
            target: "floorline_audit",
            request_id = "req-123",
            method = "POST",
            path = "/v1/events",
            status = 200_u16,
            "audit"
        );
    });

    let lines = json_lines(&sink);
    let parsed = lines.first().expect("log line");
    assert_eq!(parsed.get("level").and_then(|v| v.as_str()), Some("INFO"));
    assert_eq!(
        parsed.get("target").and_then(|v| v.as_str()),
        Some("floorline_audit")
    );
    let fields = parsed.get("fields").expect("fields object");
    assert_eq!(
        fields.get("request_id").and_then(|v| v.as_str()),
        Some("req-123")
    );
    assert_eq!(fields.get("status").and_then(|v| v.as_u64()), Some(200));
}

#[test]
fn recorded_event_log_carries_fingerprint_and_duplicate_flag() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_max_level(Level::INFO)
        .finish();
    let state = state_with(
        seeded_ledger(),
        ApiConfig {
            api_tokens: vec![TOKEN.to_string()],
            ..ApiConfig::default()
        },
    );
    let submission: EventSubmission = serde_json::from_value(json!({
        "unit_id": UNIT,
        "order_id": http_support::ORDER,
        "stage": "ship",
        "type": "shipment_dispatch",
        "ts_device": "2024-03-01T10:00:05Z",
        "carrier": "DHL",
        "tracking_number": "JD0146000033"
    }))
    .expect("submission");

    tracing::subscriber::with_default(subscriber, || {
        state
            .ingest
            .ingest(Some(TOKEN), &submission)
            .expect("ingest");
    });

    let lines = json_lines(&sink);
    let recorded = lines
        .iter()
        .find(|l| l["fields"]["message"] == "event recorded")
        .expect("event recorded line");
    assert_eq!(recorded["fields"]["unit_id"], UNIT);
    assert_eq!(recorded["fields"]["duplicate"], false);
    assert_eq!(recorded["fields"]["event_type"], "shipment_dispatch");
    assert_eq!(
        recorded["fields"]["fingerprint"]
            .as_str()
            .map(str::len),
        Some(64)
    );
}
