// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod config;
mod http;
mod metrics;
mod middleware;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use floorline_core::SystemClock;
use floorline_ingest::{IngestLimits, IngestService, StaticTokenAuthenticator};
use floorline_store::Ledger;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

pub use config::{validate_startup_config_contract, ApiConfig, CONFIG_SCHEMA_VERSION};
pub use metrics::RequestMetrics;

pub const CRATE_NAME: &str = "floorline-server";

#[derive(Clone)]
pub struct AppState {
    pub ingest: IngestService,
    pub api: ApiConfig,
    pub ready: Arc<AtomicBool>,
    pub metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(ingest: IngestService, api: ApiConfig) -> Self {
        Self {
            ingest,
            api,
            ready: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

/// Wires the production ingestion service: configured tokens, wall clock,
/// configured batch limit.
#[must_use]
pub fn ingest_service_from_config(ledger: Arc<dyn Ledger>, api: &ApiConfig) -> IngestService {
    let authenticator = if api.accept_any_bearer {
        StaticTokenAuthenticator::accept_any()
    } else {
        StaticTokenAuthenticator::new(api.api_tokens.clone())
    };
    IngestService::new(ledger, Arc::new(authenticator), Arc::new(SystemClock)).with_limits(
        IngestLimits {
            max_bulk_events: api.max_bulk_events,
        },
    )
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .route("/v1/version", get(http::handlers::version_handler))
        .route("/v1/openapi.json", get(http::handlers::openapi_handler))
        .route("/v1/events", post(http::ingest::ingest_event_handler))
        .route("/v1/events/bulk", post(http::ingest::ingest_bulk_handler))
        .route("/v1/blockers", post(http::ingest::record_blocker_handler))
        .route(
            "/v1/units/:unit_id/events",
            get(http::ingest::unit_events_handler),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
