// SPDX-License-Identifier: Apache-2.0

use floorline_store::LedgerConfig;
use serde::Serialize;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    pub max_bulk_events: usize,
    pub ledger_timeout: Duration,
    #[serde(skip)]
    pub api_tokens: Vec<String>,
    pub accept_any_bearer: bool,
    pub enable_audit_log: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
            max_bulk_events: 500,
            ledger_timeout: Duration::from_secs(5),
            api_tokens: Vec::new(),
            accept_any_bearer: false,
            enable_audit_log: false,
        }
    }
}

pub fn validate_startup_config_contract(
    api: &ApiConfig,
    ledger: &LedgerConfig,
) -> Result<(), String> {
    if api.max_body_bytes == 0 || api.max_bulk_events == 0 {
        return Err("api size limits must be > 0".to_string());
    }
    if api.ledger_timeout.is_zero() || ledger.busy_timeout.is_zero() {
        return Err("timeouts must be > 0".to_string());
    }
    if api.api_tokens.iter().all(|t| t.trim().is_empty()) && !api.accept_any_bearer {
        return Err(
            "no api tokens configured; set FLOORLINE_API_TOKENS or FLOORLINE_ACCEPT_ANY_BEARER=true"
                .to_string(),
        );
    }
    if ledger.db_path.as_os_str().is_empty() {
        return Err("ledger db path must not be empty".to_string());
    }
    Ok(())
}
