// SPDX-License-Identifier: Apache-2.0

use floorline_api::ApiErrorCode;
use floorline_ingest::IngestOutcome;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-lifetime counters rendered in Prometheus text format.
pub struct RequestMetrics {
    http_requests: AtomicU64,
    events_inserted: AtomicU64,
    events_duplicate: AtomicU64,
    bulk_batches: AtomicU64,
    errors: Vec<AtomicU64>,
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self {
            http_requests: AtomicU64::new(0),
            events_inserted: AtomicU64::new(0),
            events_duplicate: AtomicU64::new(0),
            bulk_batches: AtomicU64::new(0),
            errors: ApiErrorCode::ALL.iter().map(|_| AtomicU64::new(0)).collect(),
        }
    }
}

impl RequestMetrics {
    pub(crate) fn observe_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn observe_outcome(&self, outcome: &IngestOutcome) {
        let counter = if outcome.duplicate {
            &self.events_duplicate
        } else {
            &self.events_inserted
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn observe_bulk(&self, inserted: usize, duplicates: usize) {
        self.bulk_batches.fetch_add(1, Ordering::Relaxed);
        self.events_inserted
            .fetch_add(inserted as u64, Ordering::Relaxed);
        self.events_duplicate
            .fetch_add(duplicates as u64, Ordering::Relaxed);
    }

    pub(crate) fn observe_error(&self, code: ApiErrorCode) {
        if let Some(idx) = ApiErrorCode::ALL.iter().position(|c| *c == code) {
            self.errors[idx].fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn events_inserted(&self) -> u64 {
        self.events_inserted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn events_duplicate(&self) -> u64 {
        self.events_duplicate.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# TYPE floorline_http_requests_total counter");
        let _ = writeln!(
            out,
            "floorline_http_requests_total {}",
            self.http_requests.load(Ordering::Relaxed)
        );
        let _ = writeln!(out, "# TYPE floorline_events_total counter");
        let _ = writeln!(
            out,
            "floorline_events_total{{outcome=\"inserted\"}} {}",
            self.events_inserted()
        );
        let _ = writeln!(
            out,
            "floorline_events_total{{outcome=\"duplicate\"}} {}",
            self.events_duplicate()
        );
        let _ = writeln!(out, "# TYPE floorline_bulk_batches_total counter");
        let _ = writeln!(
            out,
            "floorline_bulk_batches_total {}",
            self.bulk_batches.load(Ordering::Relaxed)
        );
        let _ = writeln!(out, "# TYPE floorline_errors_total counter");
        for (code, counter) in ApiErrorCode::ALL.iter().zip(&self.errors) {
            let _ = writeln!(
                out,
                "floorline_errors_total{{code=\"{}\"}} {}",
                code.as_str(),
                counter.load(Ordering::Relaxed)
            );
        }
        out
    }
}
