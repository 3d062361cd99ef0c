//! Schedule endpoints — listing and cancellation.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shadehub_app::ports::{IntentInterpreter, ScheduleRepository, ShadeHub};
use shadehub_domain::error::NotFoundError;
use shadehub_domain::id::{RoomId, ScheduleId};
use shadehub_domain::intent::CommandScope;
use shadehub_domain::schedule::{Schedule, ScheduleStatus};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for the listing endpoint.
#[derive(Deserialize)]
pub struct ListParams {
    /// Restrict to schedules scoped to this room.
    pub room: Option<String>,
}

/// A schedule as returned by the API, with its recomputed next fire.
#[derive(Serialize)]
pub struct ScheduleView {
    pub id: ScheduleId,
    pub scope: CommandScope,
    pub status: ScheduleStatus,
    pub trigger: String,
    pub created_at: DateTime<Utc>,
    pub last_fired: Option<DateTime<Utc>>,
    pub firings: u32,
    pub next_fire: Option<DateTime<Utc>>,
}

fn view(schedule: &Schedule, next_fire: Option<DateTime<Utc>>) -> ScheduleView {
    ScheduleView {
        id: schedule.id,
        scope: schedule.room_scope.clone(),
        status: schedule.status,
        trigger: schedule.trigger.to_string(),
        created_at: schedule.created_at,
        last_fired: schedule.last_fired,
        firings: schedule.firings,
        next_fire,
    }
}

/// `GET /api/schedules[?room=]`
pub async fn list<N, R, H>(
    State(state): State<AppState<N, R, H>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ScheduleView>>, ApiError>
where
    N: IntentInterpreter + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    H: ShadeHub + Send + Sync + 'static,
{
    let scope = params.room.map(|room| CommandScope::Room(RoomId::new(room)));
    let schedules = state.schedules.list_schedules(scope.as_ref()).await?;

    let views = schedules
        .iter()
        .map(|schedule| {
            let next_fire = schedule
                .is_active()
                .then(|| state.schedules.next_fire_of(schedule))
                .flatten();
            view(schedule, next_fire)
        })
        .collect();
    Ok(Json(views))
}

/// `DELETE /api/schedules/{id}`
pub async fn cancel<N, R, H>(
    State(state): State<AppState<N, R, H>>,
    Path(id): Path<String>,
) -> Result<Json<ScheduleView>, ApiError>
where
    N: IntentInterpreter + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    H: ShadeHub + Send + Sync + 'static,
{
    let schedule_id = ScheduleId::from_str(&id).map_err(|_| {
        ApiError::from(shadehub_domain::error::ShadeHubError::from(NotFoundError {
            entity: "Schedule",
            id,
        }))
    })?;

    let schedule = state.schedules.cancel_schedule(schedule_id).await?;
    Ok(Json(view(&schedule, None)))
}
