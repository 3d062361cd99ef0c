//! Device executor — applies resolved actions through the hub port.
//!
//! Actions in a batch are independent: each blind is driven concurrently
//! and one failure never blocks the others. The executor owns the only
//! runtime-mutable piece of blind state, the last-known-position map,
//! updated exclusively on confirmed device responses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use shadehub_domain::action::{BlindOutcome, DispatchOutcome, ResolvedAction};
use shadehub_domain::id::{BlindId, RoomId};
use shadehub_domain::registry::BlindRegistry;
use shadehub_domain::tunables::Tunables;

use crate::ports::{HubCommandFailure, ShadeHub};

/// A blind's current position as far as the system knows.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BlindStatus {
    pub blind_id: BlindId,
    pub name: String,
    /// `None` when the hub cannot report it and no confirmed command has
    /// been recorded yet.
    pub position: Option<u8>,
}

/// Dispatches resolved actions to the device collaborator.
pub struct DeviceExecutor<H> {
    hub: H,
    registry: Arc<BlindRegistry>,
    tunables: Arc<Tunables>,
    last_known: Mutex<HashMap<BlindId, u8>>,
}

impl<H: ShadeHub + Sync> DeviceExecutor<H> {
    /// Create an executor over the given hub.
    pub fn new(hub: H, registry: Arc<BlindRegistry>, tunables: Arc<Tunables>) -> Self {
        Self {
            hub,
            registry,
            tunables,
            last_known: Mutex::new(HashMap::new()),
        }
    }

    /// Apply a batch of actions, one hub command per blind, in parallel.
    ///
    /// Returns one outcome per action, in the same order. Timeouts get
    /// one bounded retry with backoff; rejections and unknown devices are
    /// not retried.
    pub async fn dispatch(&self, actions: &[ResolvedAction]) -> Vec<BlindOutcome> {
        let results =
            futures::future::join_all(actions.iter().map(|action| self.dispatch_one(action)))
                .await;

        for outcome in &results {
            match &outcome.outcome {
                DispatchOutcome::Success { position } => {
                    tracing::info!(blind = %outcome.blind_id, position, "blind positioned");
                }
                failure => {
                    tracing::warn!(blind = %outcome.blind_id, ?failure, "blind command failed");
                }
            }
        }
        results
    }

    async fn dispatch_one(&self, action: &ResolvedAction) -> BlindOutcome {
        let mut attempts = 0u32;
        let outcome = loop {
            attempts += 1;
            match self.set_position_bounded(&action.blind_id, action.target_position).await {
                Ok(()) => {
                    self.last_known
                        .lock()
                        .await
                        .insert(action.blind_id.clone(), action.target_position);
                    break DispatchOutcome::Success {
                        position: action.target_position,
                    };
                }
                Err(HubCommandFailure::Timeout) => {
                    if attempts > self.tunables.device_retries {
                        break DispatchOutcome::DeviceTimeout;
                    }
                    tokio::time::sleep(Duration::from_millis(
                        self.tunables.device_retry_backoff_ms,
                    ))
                    .await;
                }
                Err(HubCommandFailure::Rejected { reason }) => {
                    break DispatchOutcome::DeviceRejected { reason };
                }
                Err(HubCommandFailure::UnknownDevice) => break DispatchOutcome::UnknownDevice,
            }
        };

        BlindOutcome {
            blind_id: action.blind_id.clone(),
            outcome,
        }
    }

    /// One hub call, bounded by the configured device timeout even if the
    /// adapter's own timeout misbehaves.
    async fn set_position_bounded(
        &self,
        blind: &BlindId,
        position: u8,
    ) -> Result<(), HubCommandFailure> {
        let bound = Duration::from_secs(self.tunables.device_timeout_secs);
        match tokio::time::timeout(bound, self.hub.set_position(blind, position)).await {
            Ok(result) => result,
            Err(_) => Err(HubCommandFailure::Timeout),
        }
    }

    /// Current positions for every blind in a room, falling back to the
    /// last confirmed position when the hub cannot answer.
    pub async fn room_status(&self, room: &RoomId) -> Vec<BlindStatus> {
        let blinds = self.registry.blinds_in_room(room);
        let queries = blinds.into_iter().map(|blind| async move {
            let reported = self.hub.get_position(&blind.id).await.ok().flatten();
            let position = match reported {
                Some(position) => Some(position),
                None => self.last_known.lock().await.get(&blind.id).copied(),
            };
            BlindStatus {
                blind_id: blind.id.clone(),
                name: blind.name.clone(),
                position,
            }
        });
        futures::future::join_all(queries).await
    }

    /// The last position confirmed by the device, if any.
    pub async fn last_known_position(&self, blind: &BlindId) -> Option<u8> {
        self.last_known.lock().await.get(blind).copied()
    }

    /// Borrow the underlying hub.
    pub fn hub(&self) -> &H {
        &self.hub
    }
}
