// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use floorline_core::time::parse_rfc3339_utc;
use floorline_core::FixedClock;
use floorline_ingest::{IngestLimits, IngestService, StaticTokenAuthenticator};
use floorline_model::{OrderId, OrgId, Unit, UnitId};
use floorline_server::{build_router, ApiConfig, AppState};
use floorline_store::{Ledger, MemoryLedger};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const TOKEN: &str = "line-3-tablet";
pub const UNIT: &str = "6f1c2b9a-0d4e-4f7a-8b3c-2e1d0c9b8a70";
pub const ORDER: &str = "0b7e5a52-8f0c-4a55-9d8e-3f1a2b4c5d6e";
pub const ORG: &str = "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d";

pub fn now() -> DateTime<Utc> {
    parse_rfc3339_utc("2024-03-01T10:00:09.500Z").expect("now")
}

pub fn fixture_unit() -> Unit {
    Unit {
        id: UnitId::parse(UNIT).expect("unit"),
        org_id: OrgId::parse(ORG).expect("org"),
        order_id: OrderId::parse(ORDER).expect("order"),
        unit_number: 1,
    }
}

pub fn seeded_ledger() -> Arc<MemoryLedger> {
    let ledger = Arc::new(MemoryLedger::new());
    ledger.register_unit(&fixture_unit()).expect("register unit");
    ledger
}

pub fn state_with(ledger: Arc<dyn Ledger>, api: ApiConfig) -> AppState {
    let svc = IngestService::new(
        ledger,
        Arc::new(StaticTokenAuthenticator::new(vec![TOKEN.to_string()])),
        Arc::new(FixedClock(now())),
    )
    .with_limits(IngestLimits {
        max_bulk_events: api.max_bulk_events,
    });
    let state = AppState::new(svc, api);
    state.ready.store(true, Ordering::Relaxed);
    state
}

pub async fn spawn_server(state: AppState) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

pub async fn send_raw(
    addr: std::net::SocketAddr,
    path: &str,
    headers: &[(&str, &str)],
) -> (u16, String, String) {
    send_raw_with_method(addr, "GET", path, headers, None).await
}

pub async fn send_raw_with_method(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(payload) = body {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", payload.len()));
    }
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    req.push_str("\r\n");
    if let Some(payload) = body {
        req.push_str(payload);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

pub fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (k, v) = line.split_once(':')?;
        k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
    })
}

pub fn json_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("json body")
}
