// SPDX-License-Identifier: Apache-2.0

use floorline_model::ValidationError;
use floorline_store::{StoreError, StoreErrorCode};
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestErrorCode {
    Unauthorized,
    Validation,
    NotFound,
    Storage,
}

impl IngestErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    Unauthorized(&'static str),
    Validation(ValidationError),
    NotFound(String),
    Storage(StoreError),
}

impl IngestError {
    #[must_use]
    pub const fn code(&self) -> IngestErrorCode {
        match self {
            Self::Unauthorized(_) => IngestErrorCode::Unauthorized,
            Self::Validation(_) => IngestErrorCode::Validation,
            Self::NotFound(_) => IngestErrorCode::NotFound,
            Self::Storage(_) => IngestErrorCode::Storage,
        }
    }

    /// Only transient ledger failures are worth a device retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.code.is_retryable())
    }
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(reason) => write!(f, "unauthorized: {reason}"),
            Self::Validation(e) => write!(f, "{e}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for IngestError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        if e.code == StoreErrorCode::NotFound {
            Self::NotFound(e.message)
        } else {
            Self::Storage(e)
        }
    }
}
