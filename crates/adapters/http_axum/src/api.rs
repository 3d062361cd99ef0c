//! JSON REST handlers, grouped by resource.

pub mod commands;
pub mod rooms;
pub mod schedules;
pub mod solar;

use axum::Router;
use axum::routing::{delete, get, post};

use shadehub_app::ports::{IntentInterpreter, ScheduleRepository, ShadeHub};

use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn routes<N, R, H>() -> Router<AppState<N, R, H>>
where
    N: IntentInterpreter + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    H: ShadeHub + Send + Sync + 'static,
{
    Router::new()
        .route("/rooms", get(rooms::list))
        .route("/rooms/{room}/command", post(commands::run))
        .route("/rooms/{room}/status", get(rooms::status))
        .route("/rooms/{room}/solar", get(solar::room_solar))
        .route("/schedules", get(schedules::list))
        .route("/schedules/{id}", delete(schedules::cancel))
}
