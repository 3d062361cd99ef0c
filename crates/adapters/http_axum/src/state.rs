//! Shared application state for axum handlers.

use std::sync::Arc;

use shadehub_app::executor::DeviceExecutor;
use shadehub_app::router::CommandRouter;
use shadehub_app::scheduler::ScheduleManager;
use shadehub_domain::location::Location;
use shadehub_domain::registry::BlindRegistry;
use shadehub_domain::tunables::Tunables;

/// Application state shared across all axum handlers.
///
/// Generic over the interpreter, schedule repository and hub types to
/// avoid dynamic dispatch. `Clone` is implemented manually so the
/// underlying types themselves do not need to be `Clone` — only the
/// `Arc` wrappers are cloned.
pub struct AppState<N, R, H> {
    /// The command-routing state machine.
    pub command_router: Arc<CommandRouter<N, R, H>>,
    /// Schedule lifecycle owner.
    pub schedules: Arc<ScheduleManager<R, H>>,
    /// Device executor, for status queries.
    pub executor: Arc<DeviceExecutor<H>>,
    /// The read-only room/blind registry.
    pub registry: Arc<BlindRegistry>,
    /// The site location.
    pub location: Location,
    /// Configured thresholds.
    pub tunables: Arc<Tunables>,
}

impl<N, R, H> Clone for AppState<N, R, H> {
    fn clone(&self) -> Self {
        Self {
            command_router: Arc::clone(&self.command_router),
            schedules: Arc::clone(&self.schedules),
            executor: Arc::clone(&self.executor),
            registry: Arc::clone(&self.registry),
            location: self.location,
            tunables: Arc::clone(&self.tunables),
        }
    }
}

impl<N, R, H> AppState<N, R, H> {
    /// Create state from pre-wrapped `Arc` components.
    ///
    /// The scheduler and executor are usually shared with the scheduling
    /// loop task, so this takes the `Arc`s directly.
    pub fn new(
        command_router: Arc<CommandRouter<N, R, H>>,
        schedules: Arc<ScheduleManager<R, H>>,
        executor: Arc<DeviceExecutor<H>>,
        registry: Arc<BlindRegistry>,
        location: Location,
        tunables: Arc<Tunables>,
    ) -> Self {
        Self {
            command_router,
            schedules,
            executor,
            registry,
            location,
            tunables,
        }
    }
}
