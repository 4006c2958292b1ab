// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Event ingestion: authorize, validate, fingerprint, record once.

mod auth;
mod bulk;
mod error;
mod service;

pub use auth::{Authenticator, StaticTokenAuthenticator};
pub use bulk::{BulkItemError, BulkReport};
pub use error::{IngestError, IngestErrorCode};
pub use service::{IngestLimits, IngestOutcome, IngestService, UnitHistory};

pub const CRATE_NAME: &str = "floorline-ingest";
