// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Floorline model SSOT.
//!
//! Stages, event types and blocker codes are closed enums; adding a member is
//! a breaking change every exhaustive match has to acknowledge.
//!
//! ```compile_fail
//! use floorline_model::Stage;
//!
//! fn exhaustive_match(s: Stage) -> &'static str {
//!     match s {
//!         Stage::OrderInfo => "o",
//!         Stage::BeadPrep => "b",
//!         Stage::InsertBeads => "i",
//!         Stage::Pack => "p",
//!     }
//! }
//! ```

mod candidate;
mod event;
mod fingerprint;
mod ids;
mod stage;
mod validation;

pub use candidate::{
    BlockerCandidate, BlockerSubmission, EventCandidate, EventSubmission, MAX_TEXT_LEN,
};
pub use event::{Event, EventPayload, NewEvent, Unit};
pub use fingerprint::{Fingerprint, FINGERPRINT_HEX_LEN, FINGERPRINT_SEPARATOR};
pub use ids::{EventId, InvalidUuid, OrderId, OrgId, UnitId, WorkstationId};
pub use stage::{BlockerCode, EventType, Stage, UnknownVariant};
pub use validation::{FieldError, ValidationError};

pub const CRATE_NAME: &str = "floorline-model";
