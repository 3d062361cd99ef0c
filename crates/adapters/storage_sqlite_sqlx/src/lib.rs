//! # shadehub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`ScheduleRepository`](shadehub_app::ports::ScheduleRepository) port
//! - Manage the `SQLite` connection pool lifecycle
//! - Run embedded migrations
//! - Map between domain types and database rows (JSON columns for the
//!   tagged-enum fields)
//!
//! ## Dependency rule
//! Depends on `shadehub-app` (for port traits) and `shadehub-domain` (for
//! domain types). The `app` and `domain` crates must never reference this
//! adapter.

mod error;
mod pool;
mod schedule_repo;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use schedule_repo::SqliteScheduleRepository;
