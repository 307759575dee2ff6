use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError, services::lobby_service, services::sse_service, state::SharedState,
};

#[utoipa::path(
    get,
    path = "/rooms/{id}/events",
    tag = "sse",
    params(("id" = String, Path, description = "Room code to watch")),
    responses((status = 200, description = "Room change-feed stream", content_type = "text/event-stream", body = String))
)]
/// Stream change notifications for one room to a connected client.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let room_id = lobby_service::normalize_room_code(&id)?;
    let receiver = sse_service::subscribe_room(&state, &room_id);
    info!(room_id, "new room SSE connection");
    Ok(sse_service::to_sse_stream(state, room_id, receiver))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{id}/events", get(room_stream))
}
