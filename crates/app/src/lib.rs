//! # shadehub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `IntentInterpreter` — the external NLU collaborator
//!   - `ShadeHub` — the physical device collaborator
//!   - `ScheduleRepository` — persistence for schedules
//! - Provide the **use-cases**:
//!   - `CommandRouter` — the command-routing state machine
//!   - `ExecutionPlanner` — intent → resolved per-blind actions
//!   - `DeviceExecutor` — action dispatch with retry and position tracking
//!   - `ScheduleManager` — schedule lifecycle and the periodic tick
//! - Parse schedule time/recurrence/duration phrases deterministically
//!
//! ## Dependency rule
//! Depends on `shadehub-domain` only (plus `tokio::sync`/`tokio::time` for
//! synchronization and timers). Never imports adapter crates. Adapters
//! depend on *this* crate, not the reverse.

pub mod duration;
pub mod executor;
pub mod phrase;
pub mod planner;
pub mod ports;
pub mod router;
pub mod scheduler;
