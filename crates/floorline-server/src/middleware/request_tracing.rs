// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::{extract_request_trace, RequestId};
use crate::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::{info, Instrument};

pub(crate) async fn request_tracing_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let route = request.uri().path().to_string();
    let trace = extract_request_trace(request.headers(), &state);
    state.metrics.observe_request();
    request
        .extensions_mut()
        .insert(RequestId(trace.request_id.clone()));

    let span = tracing::info_span!(
        "http.request",
        request_id = %trace.request_id,
        correlation_id = trace.correlation_id.as_deref().unwrap_or(""),
        method = %method,
        route = %route,
    );

    let mut response = next.run(request).instrument(span).await;
    if state.api.enable_audit_log {
        info!(
            target: "floorline_audit",
            method = %method,
            path = %route,
            status = response.status().as_u16(),
            request_id = %trace.request_id,
            latency_ms = started.elapsed().as_millis() as u64,
            "audit"
        );
    }
    if let Ok(value) = axum::http::HeaderValue::from_str(&trace.request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
