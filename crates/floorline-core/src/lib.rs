// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod canonical;
mod errors;
mod ports;
pub mod time;

pub use canonical::sha256_hex;
pub use errors::{ExitCode, MachineError};
pub use ports::{Clock, FixedClock, SystemClock};

pub const CRATE_NAME: &str = "floorline-core";

pub const ENV_FLOORLINE_LOG_JSON: &str = "FLOORLINE_LOG_JSON";
pub const ENV_FLOORLINE_DB_PATH: &str = "FLOORLINE_DB_PATH";
