// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

pub const API_ERROR_SCHEMA_REF: &str = "#/components/schemas/ApiError";
pub const RETRY_AFTER_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiErrorMapping {
    pub status_code: u16,
    pub schema_ref: &'static str,
    /// Seconds a client should wait before retrying, for server-side transient faults.
    pub retry_after_secs: Option<u64>,
}

#[must_use]
pub const fn status_for(code: ApiErrorCode) -> u16 {
    match code {
        ApiErrorCode::Unauthorized => 401,
        ApiErrorCode::ValidationFailed | ApiErrorCode::InvalidJson => 400,
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::PayloadTooLarge => 413,
        ApiErrorCode::StorageUnavailable => 503,
        ApiErrorCode::Internal => 500,
    }
}

#[must_use]
pub fn map_error(error: &ApiError) -> ApiErrorMapping {
    let status_code = status_for(error.code);
    ApiErrorMapping {
        status_code,
        schema_ref: API_ERROR_SCHEMA_REF,
        retry_after_secs: (status_code == 503).then_some(RETRY_AFTER_SECS),
    }
}
