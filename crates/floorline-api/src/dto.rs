// SPDX-License-Identifier: Apache-2.0

use floorline_ingest::{BulkItemError, BulkReport, IngestErrorCode, IngestOutcome, UnitHistory};
use floorline_model::{Event, EventId, FieldError, Unit};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ApiError, ApiErrorCode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestEventResponse {
    pub success: bool,
    pub event_id: EventId,
    pub duplicate: bool,
}

impl From<IngestOutcome> for IngestEventResponse {
    fn from(o: IngestOutcome) -> Self {
        Self {
            success: true,
            event_id: o.event_id,
            duplicate: o.duplicate,
        }
    }
}

/// Elements stay raw JSON so one malformed event is reported at its index
/// instead of failing the whole body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkIngestRequest {
    pub events: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkItemErrorDto {
    pub index: usize,
    pub code: ApiErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl From<BulkItemError> for BulkItemErrorDto {
    fn from(e: BulkItemError) -> Self {
        let code = match e.code {
            IngestErrorCode::Unauthorized => ApiErrorCode::Unauthorized,
            IngestErrorCode::Validation => ApiErrorCode::ValidationFailed,
            IngestErrorCode::NotFound => ApiErrorCode::NotFound,
            IngestErrorCode::Storage if e.retryable => ApiErrorCode::StorageUnavailable,
            IngestErrorCode::Storage => ApiErrorCode::Internal,
        };
        Self {
            index: e.index,
            code,
            message: e.message,
            field_errors: e.field_errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkIngestResponse {
    pub success: bool,
    pub inserted: usize,
    pub duplicates: usize,
    pub errors: Vec<BulkItemErrorDto>,
    pub results: Vec<Option<IngestOutcome>>,
}

impl From<BulkReport> for BulkIngestResponse {
    fn from(r: BulkReport) -> Self {
        Self {
            success: true,
            inserted: r.inserted,
            duplicates: r.duplicates,
            errors: r.errors.into_iter().map(BulkItemErrorDto::from).collect(),
            results: r.results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitEventsResponse {
    pub unit: Unit,
    pub events: Vec<Event>,
}

impl From<UnitHistory> for UnitEventsResponse {
    fn from(h: UnitHistory) -> Self {
        Self {
            unit: h.unit,
            events: h.events,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

impl From<ApiError> for ErrorEnvelope {
    fn from(error: ApiError) -> Self {
        Self { error }
    }
}
