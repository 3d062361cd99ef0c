//! # shadehub-adapter-virtual
//!
//! Virtual/demo hub that simulates shade controllers in memory, for
//! integration tests and for running the daemon without real hardware.
//!
//! Every blind in the registry gets a simulated motor holding a position;
//! commands outside the registry report an unknown device, and individual
//! blinds can be scripted to fail for failure-path tests.
//!
//! ## Dependency rule
//!
//! Depends on `shadehub-app` (port traits) and `shadehub-domain` only.

use std::collections::HashMap;

use tokio::sync::Mutex;

use shadehub_app::ports::{HubCommandFailure, ShadeHub};
use shadehub_domain::id::BlindId;
use shadehub_domain::registry::BlindRegistry;

/// Starting position for every simulated shade.
const INITIAL_POSITION: u8 = 50;

/// In-memory hub with one simulated motor per registered blind.
pub struct VirtualHub {
    positions: Mutex<HashMap<BlindId, u8>>,
    failures: Mutex<HashMap<BlindId, HubCommandFailure>>,
}

impl VirtualHub {
    /// Create a hub with a simulated shade for every registry blind.
    #[must_use]
    pub fn from_registry(registry: &BlindRegistry) -> Self {
        let positions = registry
            .blinds()
            .iter()
            .map(|blind| (blind.id.clone(), INITIAL_POSITION))
            .collect();
        Self {
            positions: Mutex::new(positions),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Script a blind to answer every command with `failure`.
    pub async fn fail_blind(&self, blind: BlindId, failure: HubCommandFailure) {
        self.failures.lock().await.insert(blind, failure);
    }

    /// Clear a scripted failure.
    pub async fn heal_blind(&self, blind: &BlindId) {
        self.failures.lock().await.remove(blind);
    }
}

impl ShadeHub for VirtualHub {
    async fn set_position(&self, blind: &BlindId, position: u8) -> Result<(), HubCommandFailure> {
        if let Some(failure) = self.failures.lock().await.get(blind) {
            return Err(failure.clone());
        }

        let mut positions = self.positions.lock().await;
        match positions.get_mut(blind) {
            Some(current) => {
                *current = position;
                tracing::debug!(%blind, position, "virtual shade moved");
                Ok(())
            }
            None => Err(HubCommandFailure::UnknownDevice),
        }
    }

    async fn get_position(&self, blind: &BlindId) -> Result<Option<u8>, HubCommandFailure> {
        if let Some(failure) = self.failures.lock().await.get(blind) {
            return Err(failure.clone());
        }
        Ok(self.positions.lock().await.get(blind).copied())
    }
}
