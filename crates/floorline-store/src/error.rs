// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StoreErrorCode {
    NotFound,
    Conflict,
    /// Busy or locked; the same call may succeed later.
    Unavailable,
    Io,
    Corrupt,
    Unsupported,
    Internal,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Unavailable => "unavailable",
            Self::Io => "io_error",
            Self::Corrupt => "corrupt_row",
            Self::Unsupported => "unsupported",
            Self::Internal => "internal_error",
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Unavailable | Self::Io)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn poisoned() -> Self {
        Self::new(StoreErrorCode::Internal, "ledger lock poisoned")
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        use rusqlite::{ffi, ErrorCode};
        let code = match &e {
            rusqlite::Error::SqliteFailure(err, _) => match err.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => StoreErrorCode::Unavailable,
                ErrorCode::ConstraintViolation => match err.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        StoreErrorCode::Conflict
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => StoreErrorCode::NotFound,
                    _ => StoreErrorCode::Internal,
                },
                ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull
                | ErrorCode::ReadOnly
                | ErrorCode::PermissionDenied => StoreErrorCode::Io,
                ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase => StoreErrorCode::Corrupt,
                _ => StoreErrorCode::Internal,
            },
            rusqlite::Error::QueryReturnedNoRows => StoreErrorCode::NotFound,
            _ => StoreErrorCode::Internal,
        };
        Self::new(code, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_codes_are_retryable() {
        assert!(StoreErrorCode::Unavailable.is_retryable());
        assert!(StoreErrorCode::Io.is_retryable());
        assert!(!StoreErrorCode::Conflict.is_retryable());
        assert!(!StoreErrorCode::NotFound.is_retryable());
    }

    #[test]
    fn display_carries_code_and_message() {
        let e = StoreError::new(StoreErrorCode::Conflict, "unit exists");
        assert_eq!(e.to_string(), "conflict: unit exists");
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let e = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(e.code, StoreErrorCode::NotFound);
    }
}
