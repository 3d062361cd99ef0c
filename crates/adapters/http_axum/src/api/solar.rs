//! Solar endpoint — sun state and per-window exposure for a room.

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use shadehub_app::ports::{IntentInterpreter, ScheduleRepository, ShadeHub};
use shadehub_domain::error::{NotFoundError, ShadeHubError};
use shadehub_domain::id::RoomId;
use shadehub_domain::orientation::Orientation;
use shadehub_domain::solar;

use crate::error::ApiError;
use crate::state::AppState;

/// Sun exposure of one window right now.
#[derive(Serialize)]
pub struct WindowExposure {
    pub blind_id: String,
    pub name: String,
    pub orientation: Orientation,
    pub is_sunny: bool,
}

/// Solar state for a room.
#[derive(Serialize)]
pub struct SolarReport {
    pub azimuth: f64,
    pub elevation: f64,
    pub is_up: bool,
    /// Direction the sun currently sits in.
    pub direction: Orientation,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub windows: Vec<WindowExposure>,
}

/// `GET /api/rooms/{room}/solar`
pub async fn room_solar<N, R, H>(
    State(state): State<AppState<N, R, H>>,
    Path(room): Path<String>,
) -> Result<Json<SolarReport>, ApiError>
where
    N: IntentInterpreter + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    H: ShadeHub + Send + Sync + 'static,
{
    let room = RoomId::new(room);
    if state.registry.room(&room).is_none() {
        return Err(ApiError::from(ShadeHubError::from(NotFoundError {
            entity: "Room",
            id: room.to_string(),
        })));
    }

    let now = shadehub_domain::time::now();
    let position = solar::solar_position(now, &state.location);
    let times = solar::sun_times(state.location.local_date(now), &state.location);
    let tolerance = state.tunables.sun_arc_tolerance_deg;

    let windows = state
        .registry
        .blinds_in_room(&room)
        .into_iter()
        .map(|blind| WindowExposure {
            blind_id: blind.id.to_string(),
            name: blind.name.clone(),
            orientation: blind.orientation,
            is_sunny: position.is_up()
                && blind.orientation.within_sun_arc(position.azimuth, tolerance),
        })
        .collect();

    Ok(Json(SolarReport {
        azimuth: position.azimuth,
        elevation: position.elevation,
        is_up: position.is_up(),
        direction: Orientation::from_azimuth(position.azimuth),
        sunrise: times.map(|t| t.sunrise.with_timezone(&Utc)),
        sunset: times.map(|t| t.sunset.with_timezone(&Utc)),
        windows,
    }))
}
