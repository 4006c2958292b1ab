// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::{bearer_token, RequestId};
use crate::http::response_contract::{error_response, run_ledger};
use crate::AppState;
use axum::body::{Body, Bytes};
use axum::extract::{Extension, Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use floorline_api::{
    ApiError, BulkIngestRequest, BulkIngestResponse, IngestEventResponse, UnitEventsResponse,
};
use floorline_model::{BlockerSubmission, EventSubmission};
use serde::de::DeserializeOwned;

/// Authorizes the caller, then reads and decodes the body. Authorization
/// runs first so anonymous callers learn nothing about body handling.
async fn authorized_body<T: DeserializeOwned>(
    state: &AppState,
    headers: &HeaderMap,
    body: Body,
) -> Result<(Option<String>, T), ApiError> {
    let credential = bearer_token(headers);
    state
        .ingest
        .authorize(credential.as_deref())
        .map_err(|e| ApiError::from(&e))?;
    let bytes = read_body(state, headers, body).await?;
    let value = serde_json::from_slice(&bytes).map_err(|e| ApiError::invalid_json(e.to_string()))?;
    Ok((credential, value))
}

async fn read_body(state: &AppState, headers: &HeaderMap, body: Body) -> Result<Bytes, ApiError> {
    let max = state.api.max_body_bytes;
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|n| n > max) {
        return Err(ApiError::payload_too_large(max));
    }
    axum::body::to_bytes(body, max)
        .await
        .map_err(|_| ApiError::payload_too_large(max))
}

pub(crate) async fn ingest_event_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let (credential, submission) =
        match authorized_body::<EventSubmission>(&state, &headers, body).await {
            Ok(parts) => parts,
            Err(err) => return error_response(&state, &request_id, err),
        };
    let svc = state.ingest.clone();
    match run_ledger(&state, move || svc.ingest(credential.as_deref(), &submission)).await {
        Ok(outcome) => {
            state.metrics.observe_outcome(&outcome);
            Json(IngestEventResponse::from(outcome)).into_response()
        }
        Err(e) => error_response(&state, &request_id, ApiError::from(&e)),
    }
}

pub(crate) async fn record_blocker_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let (credential, submission) =
        match authorized_body::<BlockerSubmission>(&state, &headers, body).await {
            Ok(parts) => parts,
            Err(err) => return error_response(&state, &request_id, err),
        };
    let svc = state.ingest.clone();
    match run_ledger(&state, move || {
        svc.record_blocker(credential.as_deref(), &submission)
    })
    .await
    {
        Ok(outcome) => {
            state.metrics.observe_outcome(&outcome);
            Json(IngestEventResponse::from(outcome)).into_response()
        }
        Err(e) => error_response(&state, &request_id, ApiError::from(&e)),
    }
}

pub(crate) async fn ingest_bulk_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let (credential, request) =
        match authorized_body::<BulkIngestRequest>(&state, &headers, body).await {
            Ok(parts) => parts,
            Err(err) => return error_response(&state, &request_id, err),
        };
    let svc = state.ingest.clone();
    match run_ledger(&state, move || {
        svc.ingest_bulk(credential.as_deref(), &request.events)
    })
    .await
    {
        Ok(report) => {
            state.metrics.observe_bulk(report.inserted, report.duplicates);
            Json(BulkIngestResponse::from(report)).into_response()
        }
        Err(e) => error_response(&state, &request_id, ApiError::from(&e)),
    }
}

pub(crate) async fn unit_events_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(unit_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let credential = bearer_token(&headers);
    if let Err(e) = state.ingest.authorize(credential.as_deref()) {
        return error_response(&state, &request_id, ApiError::from(&e));
    }
    let svc = state.ingest.clone();
    match run_ledger(&state, move || {
        svc.list_unit_events(credential.as_deref(), &unit_id)
    })
    .await
    {
        Ok(history) => Json(UnitEventsResponse::from(history)).into_response(),
        Err(e) => error_response(&state, &request_id, ApiError::from(&e)),
    }
}
