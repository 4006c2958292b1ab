// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl Display for UnknownVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! closed_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

/// Step in the fixed production sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    OrderInfo,
    BeadPrep,
    InsertBeads,
    Pack,
    Ship,
}

closed_enum!(Stage, "stage", {
    OrderInfo => "order_info",
    BeadPrep => "bead_prep",
    InsertBeads => "insert_beads",
    Pack => "pack",
    Ship => "ship",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    StageStart,
    StageComplete,
    ReworkOrderInfo,
    ReworkBeadPrep,
    ReworkInsertBeads,
    ReworkPack,
    Blocker,
    ShipmentDispatch,
    Annotation,
}

closed_enum!(EventType, "event type", {
    StageStart => "stage_start",
    StageComplete => "stage_complete",
    ReworkOrderInfo => "rework_order_info",
    ReworkBeadPrep => "rework_bead_prep",
    ReworkInsertBeads => "rework_insert_beads",
    ReworkPack => "rework_pack",
    Blocker => "blocker",
    ShipmentDispatch => "shipment_dispatch",
    Annotation => "annotation",
});

impl EventType {
    #[must_use]
    pub const fn is_rework(self) -> bool {
        matches!(
            self,
            Self::ReworkOrderInfo | Self::ReworkBeadPrep | Self::ReworkInsertBeads | Self::ReworkPack
        )
    }
}

/// Reason a stage cannot progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockerCode {
    MaterialShortage,
    EquipmentFailure,
    QualityIssue,
    WaitingForPreviousStage,
    Other,
}

closed_enum!(BlockerCode, "blocker code", {
    MaterialShortage => "MATERIAL_SHORTAGE",
    EquipmentFailure => "EQUIPMENT_FAILURE",
    QualityIssue => "QUALITY_ISSUE",
    WaitingForPreviousStage => "WAITING_FOR_PREVIOUS_STAGE",
    Other => "OTHER",
});
