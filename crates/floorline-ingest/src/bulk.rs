// SPDX-License-Identifier: Apache-2.0

use floorline_model::FieldError;
use serde::Serialize;

use crate::{IngestError, IngestErrorCode, IngestOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkItemError {
    pub index: usize,
    pub code: IngestErrorCode,
    pub message: String,
    /// Set only for transient ledger failures; resending the element may succeed.
    pub retryable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

/// Per-batch tally. `results` is index-aligned with the input; failed
/// elements hold `None` and have a matching entry in `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub errors: Vec<BulkItemError>,
    pub results: Vec<Option<IngestOutcome>>,
}

impl BulkReport {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            results: Vec::with_capacity(n),
            ..Self::default()
        }
    }

    pub(crate) fn push(&mut self, index: usize, outcome: Result<IngestOutcome, IngestError>) {
        match outcome {
            Ok(o) => {
                if o.duplicate {
                    self.duplicates += 1;
                } else {
                    self.inserted += 1;
                }
                self.results.push(Some(o));
            }
            Err(e) => {
                let field_errors = match &e {
                    IngestError::Validation(v) => v.field_errors.clone(),
                    _ => Vec::new(),
                };
                self.errors.push(BulkItemError {
                    index,
                    code: e.code(),
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                    field_errors,
                });
                self.results.push(None);
            }
        }
    }
}
