use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::room::{CreateRoomRequest, JoinRoomRequest, JoinedRoomResponse, RoomSnapshot},
    error::AppError,
    services::lobby_service,
    state::SharedState,
};

/// Routes handling room bootstrap operations (creation, joining, snapshots).
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{id}/join", post(join_room))
        .route("/rooms/{id}", get(get_room))
}

/// Create a fresh room and register the caller as its host.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "room",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = JoinedRoomResponse)
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<JoinedRoomResponse>, AppError> {
    payload.validate()?;
    let joined = lobby_service::create_room(&state, payload).await?;
    Ok(Json(joined))
}

/// Join a lobby-phase room using its shareable code.
#[utoipa::path(
    post,
    path = "/rooms/{id}/join",
    tag = "room",
    params(("id" = String, Path, description = "Room code to join")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined the room", body = JoinedRoomResponse)
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<JoinedRoomResponse>, AppError> {
    payload.validate()?;
    let joined = lobby_service::join_room(&state, id, payload).await?;
    Ok(Json(joined))
}

/// Read the full current state of a room, roster included.
#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "room",
    params(("id" = String, Path, description = "Room code to read")),
    responses(
        (status = 200, description = "Current room state", body = RoomSnapshot)
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = lobby_service::room_snapshot(&state, id).await?;
    Ok(Json(snapshot))
}
