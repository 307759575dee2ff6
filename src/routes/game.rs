use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::room::{
        ActionResponse, InvestRequest, LeaveRequest, LeaveResponse, PlayAgainRequest,
        PlayAgainResponse, ResultsResponse, StartGameRequest,
    },
    error::AppError,
    services::{game_service, lobby_service},
    state::SharedState,
};

/// Routes driving the round lifecycle of an existing room.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{id}/start", post(start_game))
        .route("/rooms/{id}/invest", post(submit_investment))
        .route("/rooms/{id}/leave", post(leave_room))
        .route("/rooms/{id}/play-again", post(play_again))
        .route("/rooms/{id}/results", get(get_results))
}

/// Host-only: move the room from the lobby into the collection phase.
#[utoipa::path(
    post,
    path = "/rooms/{id}/start",
    tag = "game",
    params(("id" = String, Path, description = "Room code")),
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Round started", body = ActionResponse)
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<StartGameRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let id = lobby_service::normalize_room_code(&id)?;
    game_service::start_game(&state, id, payload.player_id).await?;
    Ok(Json(ActionResponse::ok()))
}

/// Submit one blind allocation for the current round.
#[utoipa::path(
    post,
    path = "/rooms/{id}/invest",
    tag = "game",
    params(("id" = String, Path, description = "Room code")),
    request_body = InvestRequest,
    responses(
        (status = 200, description = "Allocation recorded", body = ActionResponse)
    )
)]
pub async fn submit_investment(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<InvestRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let id = lobby_service::normalize_room_code(&id)?;
    game_service::submit_investment(&state, id, payload).await?;
    Ok(Json(ActionResponse::ok()))
}

/// Leave the room, or kick another player when called by the host.
#[utoipa::path(
    post,
    path = "/rooms/{id}/leave",
    tag = "game",
    params(("id" = String, Path, description = "Room code")),
    request_body = LeaveRequest,
    responses(
        (status = 200, description = "Departure handled", body = LeaveResponse)
    )
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<LeaveRequest>,
) -> Result<Json<LeaveResponse>, AppError> {
    let id = lobby_service::normalize_room_code(&id)?;
    let outcome = game_service::leave_or_kick(&state, id, payload).await?;
    Ok(Json(outcome))
}

/// Vote to restart the round after results.
#[utoipa::path(
    post,
    path = "/rooms/{id}/play-again",
    tag = "game",
    params(("id" = String, Path, description = "Room code")),
    request_body = PlayAgainRequest,
    responses(
        (status = 200, description = "Vote registered", body = PlayAgainResponse)
    )
)]
pub async fn play_again(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<PlayAgainRequest>,
) -> Result<Json<PlayAgainResponse>, AppError> {
    let id = lobby_service::normalize_room_code(&id)?;
    let outcome = game_service::play_again(&state, id, payload.player_id).await?;
    Ok(Json(outcome))
}

/// Read the ranked payout table of a finished round.
#[utoipa::path(
    get,
    path = "/rooms/{id}/results",
    tag = "game",
    params(("id" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Payout table", body = ResultsResponse)
    )
)]
pub async fn get_results(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ResultsResponse>, AppError> {
    let id = lobby_service::normalize_room_code(&id)?;
    let results = game_service::results(&state, id).await?;
    Ok(Json(results))
}
