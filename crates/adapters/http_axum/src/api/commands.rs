//! Command endpoint — one state-machine run per request.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use shadehub_app::ports::{IntentInterpreter, ScheduleRepository, ShadeHub};
use shadehub_app::router::CommandResponse;
use shadehub_domain::error::Diagnostic;
use shadehub_domain::id::RoomId;

use crate::state::AppState;

/// Request body for running a command.
#[derive(Deserialize)]
pub struct CommandRequest {
    /// Natural-language command text.
    pub command: String,
}

/// `POST /api/rooms/{room}/command`
///
/// Device-level failures are aggregated into an `executed` response, not
/// an HTTP error; only a failed state-machine run maps to an error
/// status, carrying its diagnostic code in the body.
pub async fn run<N, R, H>(
    State(state): State<AppState<N, R, H>>,
    Path(room): Path<String>,
    Json(request): Json<CommandRequest>,
) -> Response
where
    N: IntentInterpreter + Send + Sync + 'static,
    R: ScheduleRepository + Send + Sync + 'static,
    H: ShadeHub + Send + Sync + 'static,
{
    let response = state
        .command_router
        .handle_command(&request.command, RoomId::new(room))
        .await;

    let status = match &response {
        CommandResponse::Failed { diagnostic, .. } => status_for(*diagnostic),
        CommandResponse::Scheduled { .. } => StatusCode::CREATED,
        CommandResponse::Executed { .. } | CommandResponse::ScheduleCancelled { .. } => {
            StatusCode::OK
        }
    };
    (status, Json(response)).into_response()
}

fn status_for(diagnostic: Diagnostic) -> StatusCode {
    match diagnostic {
        Diagnostic::InvalidScope => StatusCode::NOT_FOUND,
        Diagnostic::NoTargetResolved
        | Diagnostic::ScheduleParseError
        | Diagnostic::NluMalformed => StatusCode::UNPROCESSABLE_ENTITY,
        Diagnostic::NluTimeout | Diagnostic::DeviceTimeout => StatusCode::GATEWAY_TIMEOUT,
        Diagnostic::DeviceRejected | Diagnostic::UnknownDevice => StatusCode::BAD_GATEWAY,
        Diagnostic::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
