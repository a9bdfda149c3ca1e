use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::{info, instrument};

use super::{
    models::RoomId,
    types::{LeaveRoomResponse, PlayerScore, RoomResponse, RoomStatusResponse},
};
use crate::session::IdentityClaims;
use crate::shared::{AppError, AppState};

/// HTTP handler for "am I in a room?"
///
/// GET /room/status
#[instrument(name = "room_status", skip(state, claims))]
pub async fn room_status(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
) -> Result<Json<RoomStatusResponse>, AppError> {
    let status = state
        .orchestrator
        .check_player_room(&claims.mobile_number)
        .await?;
    Ok(Json(status))
}

/// HTTP handler for leaving the current room
///
/// POST /room/leave
#[instrument(name = "leave_room", skip(state, claims))]
pub async fn leave_room(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
) -> Result<Json<LeaveRoomResponse>, AppError> {
    let success = state
        .orchestrator
        .remove_player_by_identity(&claims.mobile_number)
        .await?;

    info!(username = %claims.username, success, "Leave requested over HTTP");
    Ok(Json(LeaveRoomResponse { success }))
}

/// GET /game/room/:room_id
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<RoomResponse>, AppError> {
    Ok(Json(state.room_service.room_details(room_id).await?))
}

/// GET /game/room/:room_id/scores
#[instrument(name = "get_room_scores", skip(state))]
pub async fn get_room_scores(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Vec<PlayerScore>>, AppError> {
    Ok(Json(state.room_service.scores(room_id).await?))
}
