//! # shadehub-adapter-http-axum
//!
//! JSON REST surface for shadehub.
//!
//! ## Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | POST | `/api/rooms/{room}/command` | run a natural-language command |
//! | GET | `/api/rooms` | list rooms and their blinds |
//! | GET | `/api/rooms/{room}/status` | current blind positions |
//! | GET | `/api/rooms/{room}/solar` | sun state and per-window exposure |
//! | GET | `/api/schedules` | list schedules (`?room=` to filter) |
//! | DELETE | `/api/schedules/{id}` | cancel a schedule |
//! | GET | `/health` | liveness check |
//!
//! ## Dependency rule
//! Depends on `shadehub-app` (ports and use-cases) and `shadehub-domain`.
//! The `app` and `domain` crates must never reference this adapter.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
