//! Room endpoints — registry listing and live position status.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use shadehub_app::executor::BlindStatus;
use shadehub_app::ports::{IntentInterpreter, ScheduleRepository, ShadeHub};
use shadehub_domain::error::NotFoundError;
use shadehub_domain::id::RoomId;
use shadehub_domain::orientation::Orientation;

use crate::error::ApiError;
use crate::state::AppState;

/// One room with its blinds, as configured.
#[derive(Serialize)]
pub struct RoomInfo {
    pub id: String,
    pub name: String,
    pub blinds: Vec<BlindInfo>,
}

/// One blind, as configured.
#[derive(Serialize)]
pub struct BlindInfo {
    pub id: String,
    pub name: String,
    pub orientation: Orientation,
}

/// `GET /api/rooms`
pub async fn list<N, R, H>(State(state): State<AppState<N, R, H>>) -> Json<Vec<RoomInfo>>
where
    N: IntentInterpreter + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    H: ShadeHub + Send + Sync + 'static,
{
    let rooms = state
        .registry
        .rooms()
        .iter()
        .map(|room| RoomInfo {
            id: room.id.to_string(),
            name: room.name.clone(),
            blinds: state
                .registry
                .blinds_in_room(&room.id)
                .into_iter()
                .map(|blind| BlindInfo {
                    id: blind.id.to_string(),
                    name: blind.name.clone(),
                    orientation: blind.orientation,
                })
                .collect(),
        })
        .collect();
    Json(rooms)
}

/// `GET /api/rooms/{room}/status`
pub async fn status<N, R, H>(
    State(state): State<AppState<N, R, H>>,
    Path(room): Path<String>,
) -> Result<Json<Vec<BlindStatus>>, ApiError>
where
    N: IntentInterpreter + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    H: ShadeHub + Send + Sync + 'static,
{
    let room = RoomId::new(room);
    if state.registry.room(&room).is_none() {
        return Err(ApiError::from(shadehub_domain::error::ShadeHubError::from(
            NotFoundError {
                entity: "Room",
                id: room.to_string(),
            },
        )));
    }
    Ok(Json(state.executor.room_status(&room).await))
}
