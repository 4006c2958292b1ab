// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use floorline_core::{ENV_FLOORLINE_DB_PATH, ENV_FLOORLINE_LOG_JSON};
use floorline_server::{
    build_router, ingest_service_from_config, validate_startup_config_contract, ApiConfig,
    AppState,
};
use floorline_store::{LedgerConfig, SqliteLedger};
use std::env;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn env_list(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("unix signal handlers unavailable; falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool(ENV_FLOORLINE_LOG_JSON, true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("FLOORLINE_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let api = ApiConfig {
        max_body_bytes: env_usize("FLOORLINE_MAX_BODY_BYTES", 1024 * 1024),
        max_bulk_events: env_usize("FLOORLINE_MAX_BULK_EVENTS", 500),
        ledger_timeout: env_duration_ms("FLOORLINE_LEDGER_TIMEOUT_MS", 5_000),
        api_tokens: env_list("FLOORLINE_API_TOKENS"),
        accept_any_bearer: env_bool("FLOORLINE_ACCEPT_ANY_BEARER", false),
        enable_audit_log: env_bool("FLOORLINE_AUDIT_LOG", false),
    };
    let ledger_cfg = LedgerConfig {
        db_path: PathBuf::from(
            env::var(ENV_FLOORLINE_DB_PATH).unwrap_or_else(|_| "floorline.sqlite".to_string()),
        ),
        busy_timeout: env_duration_ms("FLOORLINE_SQLITE_BUSY_TIMEOUT_MS", 5_000),
        ..LedgerConfig::default()
    };
    validate_startup_config_contract(&api, &ledger_cfg)?;
    info!(
        config = %serde_json::to_string(&api).unwrap_or_default(),
        db_path = %ledger_cfg.db_path.display(),
        tokens = api.api_tokens.len(),
        "startup config accepted"
    );

    let ledger = tokio::task::spawn_blocking(move || SqliteLedger::open(ledger_cfg))
        .await
        .map_err(|e| format!("ledger open task failed: {e}"))?
        .map_err(|e| format!("ledger open failed: {e}"))?;
    let service = ingest_service_from_config(Arc::new(ledger), &api);
    let state = AppState::new(service, api);
    state.ready.store(true, Ordering::Relaxed);
    let app = build_router(state.clone());

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("floorline-server listening on {bind_addr}");
    let ready = state.ready.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            ready.store(false, Ordering::Relaxed);
            let drain_ms = env_u64("FLOORLINE_SHUTDOWN_DRAIN_MS", 5_000);
            info!(drain_ms, "shutdown signal received; draining");
            tokio::time::sleep(Duration::from_millis(drain_ms)).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
