// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod dto;
pub mod error_mapping;
mod errors;
pub mod openapi;

pub use dto::{
    BulkIngestRequest, BulkIngestResponse, BulkItemErrorDto, ErrorEnvelope, IngestEventResponse,
    UnitEventsResponse,
};
pub use errors::{ApiError, ApiErrorCode};
pub use openapi::openapi_v1_spec;

pub const CRATE_NAME: &str = "floorline-api";
pub const API_VERSION: &str = "v1";
