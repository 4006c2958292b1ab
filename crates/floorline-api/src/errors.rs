// SPDX-License-Identifier: Apache-2.0

use floorline_ingest::IngestError;
use floorline_model::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    Unauthorized,
    ValidationFailed,
    InvalidJson,
    NotFound,
    PayloadTooLarge,
    StorageUnavailable,
    Internal,
}

impl ApiErrorCode {
    pub const ALL: &'static [ApiErrorCode] = &[
        Self::Unauthorized,
        Self::ValidationFailed,
        Self::InvalidJson,
        Self::NotFound,
        Self::PayloadTooLarge,
        Self::StorageUnavailable,
        Self::Internal,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::ValidationFailed => "ValidationFailed",
            Self::InvalidJson => "InvalidJson",
            Self::NotFound => "NotFound",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::StorageUnavailable => "StorageUnavailable",
            Self::Internal => "Internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Value,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: request_id.into(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn validation_failed(err: &ValidationError) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            "validation failed",
            json!({ "field_errors": err.field_errors }),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn invalid_json(reason: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::InvalidJson,
            "request body is not valid JSON for this endpoint",
            json!({ "reason": reason.into() }),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn unauthorized(reason: &str) -> Self {
        Self::new(
            ApiErrorCode::Unauthorized,
            reason,
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn payload_too_large(max_bytes: usize) -> Self {
        Self::new(
            ApiErrorCode::PayloadTooLarge,
            "request body too large",
            json!({ "max_body_bytes": max_bytes }),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn storage_unavailable(reason: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::StorageUnavailable,
            "ledger unavailable",
            json!({ "reason": reason.into(), "retryable": true }),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::Internal,
            "internal error",
            json!({ "reason": reason.into() }),
            "req-unknown",
        )
    }
}

impl From<&IngestError> for ApiError {
    fn from(err: &IngestError) -> Self {
        match err {
            IngestError::Unauthorized(reason) => Self::unauthorized(reason),
            IngestError::Validation(v) => Self::validation_failed(v),
            IngestError::NotFound(what) => Self::new(
                ApiErrorCode::NotFound,
                "not found",
                json!({ "reason": what }),
                "req-unknown",
            ),
            IngestError::Storage(e) if e.code.is_retryable() => {
                Self::storage_unavailable(e.to_string())
            }
            IngestError::Storage(e) => Self::internal(e.to_string()),
        }
    }
}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
    assert_traits::<ApiError>();
};
