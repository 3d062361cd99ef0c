//! Device hub port — the physical shade-controller collaborator.

use std::future::Future;

use shadehub_domain::id::BlindId;

/// Why a hub command did not land on the device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubCommandFailure {
    /// The hub or device did not answer in time. Retried once by the
    /// executor before being reported.
    #[error("device did not respond")]
    Timeout,

    /// The hub or device refused the command. Not retried.
    #[error("device rejected the command: {reason}")]
    Rejected { reason: String },

    /// The hub does not know the device. Not retried.
    #[error("device is unknown to the hub")]
    UnknownDevice,
}

/// Sends position commands to the shade controllers behind the hub.
pub trait ShadeHub {
    /// Drive a blind to `position` (0–100) and await confirmation.
    fn set_position(
        &self,
        blind: &BlindId,
        position: u8,
    ) -> impl Future<Output = Result<(), HubCommandFailure>> + Send;

    /// Read a blind's current position, if the hub knows it.
    fn get_position(
        &self,
        blind: &BlindId,
    ) -> impl Future<Output = Result<Option<u8>, HubCommandFailure>> + Send;
}
