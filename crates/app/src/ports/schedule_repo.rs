//! Schedule repository port — durable storage for schedules.
//!
//! The schedule manager is the only writer; implementations must
//! serialize status transitions per schedule so a cancel racing a firing
//! cannot both finalize the same record.

use std::future::Future;

use shadehub_domain::error::ShadeHubError;
use shadehub_domain::id::ScheduleId;
use shadehub_domain::schedule::Schedule;

/// Repository for persisting and querying [`Schedule`]s.
///
/// Only the schedule record itself is persisted — never a computed
/// next-fire time, which is re-derived from the trigger after restart.
pub trait ScheduleRepository {
    /// Persist a new schedule.
    fn create(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, ShadeHubError>> + Send;

    /// Get a schedule by its unique identifier.
    fn get_by_id(
        &self,
        id: ScheduleId,
    ) -> impl Future<Output = Result<Option<Schedule>, ShadeHubError>> + Send;

    /// Get all schedules, regardless of status.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Schedule>, ShadeHubError>> + Send;

    /// Get all schedules that can still fire.
    fn get_active(&self) -> impl Future<Output = Result<Vec<Schedule>, ShadeHubError>> + Send;

    /// Update an existing schedule (status transitions, firing records).
    fn update(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<Schedule, ShadeHubError>> + Send;

    /// Delete a schedule record outright (retention cleanup).
    fn delete(&self, id: ScheduleId) -> impl Future<Output = Result<(), ShadeHubError>> + Send;
}
