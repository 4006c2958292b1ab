// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::RequestId;
use crate::http::response_contract::{error_response, run_ledger};
use crate::AppState;
use axum::extract::{Extension, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use floorline_api::{openapi_v1_spec, ApiError, API_VERSION};
use serde_json::json;
use std::sync::atomic::Ordering;

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn readyz_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    if !state.ready.load(Ordering::Relaxed) {
        return error_response(
            &state,
            &request_id,
            ApiError::storage_unavailable("server is not accepting traffic"),
        );
    }
    let ledger = state.ingest.ledger().clone();
    match run_ledger(&state, move || ledger.ping().map_err(Into::into)).await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ready"}))).into_response(),
        Err(e) => error_response(&state, &request_id, ApiError::from(&e)),
    }
}

pub(crate) async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": crate::CRATE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "api": API_VERSION,
        "config_schema": crate::CONFIG_SCHEMA_VERSION,
    }))
}

pub(crate) async fn openapi_handler() -> impl IntoResponse {
    Json(openapi_v1_spec())
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
