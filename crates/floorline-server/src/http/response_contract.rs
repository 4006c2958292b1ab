// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::RequestId;
use crate::AppState;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use floorline_api::error_mapping::map_error;
use floorline_api::{ApiError, ErrorEnvelope};
use floorline_ingest::IngestError;
use floorline_store::{StoreError, StoreErrorCode};
use tracing::{error, warn};

pub(crate) fn error_response(state: &AppState, request_id: &RequestId, err: ApiError) -> Response {
    let err = err.with_request_id(request_id.0.clone());
    let mapping = map_error(&err);
    state.metrics.observe_error(err.code);
    if mapping.status_code >= 500 {
        error!(code = err.code.as_str(), message = %err.message, details = %err.details, "request failed");
    } else {
        warn!(code = err.code.as_str(), message = %err.message, "request rejected");
    }
    let status =
        StatusCode::from_u16(mapping.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(ErrorEnvelope::from(err))).into_response();
    if let Some(secs) = mapping.retry_after_secs {
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert("retry-after", value);
        }
    }
    response
}

/// Runs a synchronous ledger-backed call on the blocking pool, bounded by
/// the configured ledger timeout.
pub(crate) async fn run_ledger<T, F>(state: &AppState, f: F) -> Result<T, IngestError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, IngestError> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(state.api.ledger_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(IngestError::Storage(StoreError::new(
            StoreErrorCode::Internal,
            format!("ledger task failed: {join}"),
        ))),
        Err(_) => Err(IngestError::Storage(StoreError::new(
            StoreErrorCode::Unavailable,
            format!(
                "ledger call exceeded {} ms",
                state.api.ledger_timeout.as_millis()
            ),
        ))),
    }
}
