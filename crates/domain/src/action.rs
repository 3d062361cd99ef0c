//! Resolved actions — concrete per-blind targets produced by the planner
//! and consumed exactly once by the device executor.

use serde::{Deserialize, Serialize};

use crate::id::BlindId;

/// Why a blind received its target position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionReason {
    /// The command named the blind (or all blinds) explicitly.
    Direct,
    /// The blind was picked or positioned from the sun's current state.
    SolarResolved,
    /// The position came from the qualitative lookup table's default.
    Default,
}

/// One blind, one target position. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAction {
    pub blind_id: BlindId,
    /// Target openness, 0 (closed) to 100 (open), inclusive.
    pub target_position: u8,
    pub reason: ResolutionReason,
}

/// Per-blind result of dispatching one [`ResolvedAction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The device confirmed the new position.
    Success { position: u8 },
    /// The device did not answer within the bound (after retry).
    DeviceTimeout,
    /// The device or hub refused the command.
    DeviceRejected { reason: String },
    /// The hub does not know the device.
    UnknownDevice,
}

impl DispatchOutcome {
    /// Whether the action landed on the device.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Outcome of one action within a dispatched batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindOutcome {
    pub blind_id: BlindId,
    pub outcome: DispatchOutcome,
}
