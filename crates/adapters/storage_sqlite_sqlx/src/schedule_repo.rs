//! `SQLite` implementation of [`ScheduleRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use shadehub_app::ports::ScheduleRepository;
use shadehub_domain::error::ShadeHubError;
use shadehub_domain::id::ScheduleId;
use shadehub_domain::intent::{CommandScope, Directive};
use shadehub_domain::schedule::{Expiry, Schedule, ScheduleStatus, Trigger};

use crate::error::StorageError;

struct Wrapper(Schedule);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Schedule> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let scope_json: String = row.try_get("room_scope")?;
        let template_json: String = row.try_get("action_template")?;
        let trigger_json: String = row.try_get("trigger_data")?;
        let expiry_json: String = row.try_get("expiry")?;
        let created_at_str: String = row.try_get("created_at")?;
        let status_str: String = row.try_get("status")?;
        let last_fired_str: Option<String> = row.try_get("last_fired")?;
        let firings: i64 = row.try_get("firings")?;
        let last_firing_failed: bool = row.try_get("last_firing_failed")?;

        let id = ScheduleId::from_str(&id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let room_scope: CommandScope = serde_json::from_str(&scope_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let action_template: Vec<Directive> = serde_json::from_str(&template_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let trigger: Trigger = serde_json::from_str(&trigger_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let expiry: Expiry = serde_json::from_str(&expiry_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.to_utc())
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let status = decode_status(&status_str).map_err(|err| sqlx::Error::Decode(err.into()))?;
        let last_fired = last_fired_str
            .map(|s| {
                chrono::DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.to_utc())
                    .map_err(|err| sqlx::Error::Decode(Box::new(err)))
            })
            .transpose()?;

        Ok(Self(Schedule {
            id,
            room_scope,
            action_template,
            trigger,
            expiry,
            created_at,
            status,
            last_fired,
            firings: u32::try_from(firings.max(0)).unwrap_or(u32::MAX),
            last_firing_failed,
        }))
    }
}

fn encode_status(status: ScheduleStatus) -> &'static str {
    match status {
        ScheduleStatus::Active => "active",
        ScheduleStatus::Expired => "expired",
        ScheduleStatus::Cancelled => "cancelled",
    }
}

fn decode_status(status: &str) -> Result<ScheduleStatus, String> {
    match status {
        "active" => Ok(ScheduleStatus::Active),
        "expired" => Ok(ScheduleStatus::Expired),
        "cancelled" => Ok(ScheduleStatus::Cancelled),
        other => Err(format!("unknown schedule status '{other}'")),
    }
}

/// `SQLite`-backed schedule repository.
pub struct SqliteScheduleRepository {
    pool: SqlitePool,
}

impl SqliteScheduleRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScheduleRepository for SqliteScheduleRepository {
    async fn create(&self, schedule: Schedule) -> Result<Schedule, ShadeHubError> {
        let scope_json = serde_json::to_string(&schedule.room_scope).map_err(StorageError::from)?;
        let template_json =
            serde_json::to_string(&schedule.action_template).map_err(StorageError::from)?;
        let trigger_json = serde_json::to_string(&schedule.trigger).map_err(StorageError::from)?;
        let expiry_json = serde_json::to_string(&schedule.expiry).map_err(StorageError::from)?;
        let last_fired = schedule.last_fired.map(|ts| ts.to_rfc3339());

        sqlx::query(
                "INSERT INTO schedules (id, room_scope, action_template, trigger_data, expiry, created_at, status, last_fired, firings, last_firing_failed) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(schedule.id.to_string())
            .bind(&scope_json)
            .bind(&template_json)
            .bind(&trigger_json)
            .bind(&expiry_json)
            .bind(schedule.created_at.to_rfc3339())
            .bind(encode_status(schedule.status))
            .bind(&last_fired)
            .bind(i64::from(schedule.firings))
            .bind(schedule.last_firing_failed)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(schedule)
    }

    async fn get_by_id(&self, id: ScheduleId) -> Result<Option<Schedule>, ShadeHubError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM schedules WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Schedule>, ShadeHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM schedules ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_active(&self) -> Result<Vec<Schedule>, ShadeHubError> {
        let rows: Vec<Wrapper> =
            sqlx::query_as("SELECT * FROM schedules WHERE status = 'active' ORDER BY created_at")
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    /// Update a schedule. The write is guarded on the row still being
    /// active, so a cancel and a tick racing on the same schedule cannot
    /// both finalize it — whichever lands first wins, and the stored
    /// record is returned to the loser.
    async fn update(&self, schedule: Schedule) -> Result<Schedule, ShadeHubError> {
        let template_json =
            serde_json::to_string(&schedule.action_template).map_err(StorageError::from)?;
        let trigger_json = serde_json::to_string(&schedule.trigger).map_err(StorageError::from)?;
        let expiry_json = serde_json::to_string(&schedule.expiry).map_err(StorageError::from)?;
        let last_fired = schedule.last_fired.map(|ts| ts.to_rfc3339());

        let result = sqlx::query(
                "UPDATE schedules SET action_template = ?, trigger_data = ?, expiry = ?, status = ?, last_fired = ?, firings = ?, last_firing_failed = ? WHERE id = ? AND status = 'active'",
            )
            .bind(&template_json)
            .bind(&trigger_json)
            .bind(&expiry_json)
            .bind(encode_status(schedule.status))
            .bind(&last_fired)
            .bind(i64::from(schedule.firings))
            .bind(schedule.last_firing_failed)
            .bind(schedule.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            // Already finalized by a concurrent transition.
            if let Some(stored) = self.get_by_id(schedule.id).await? {
                return Ok(stored);
            }
        }
        Ok(schedule)
    }

    async fn delete(&self, id: ScheduleId) -> Result<(), ShadeHubError> {
        sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
