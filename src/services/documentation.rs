use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Blind Pool Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::create_room,
        crate::routes::room::join_room,
        crate::routes::room::get_room,
        crate::routes::game::start_game,
        crate::routes::game::submit_investment,
        crate::routes::game::leave_room,
        crate::routes::game::play_again,
        crate::routes::game::get_results,
        crate::routes::sse::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::StartGameRequest,
            crate::dto::room::InvestRequest,
            crate::dto::room::LeaveRequest,
            crate::dto::room::PlayAgainRequest,
            crate::dto::room::RoomSummary,
            crate::dto::room::PlayerSummary,
            crate::dto::room::RoomSnapshot,
            crate::dto::room::JoinedRoomResponse,
            crate::dto::room::ActionResponse,
            crate::dto::room::LeaveResponse,
            crate::dto::room::PlayAgainResponse,
            crate::dto::room::ResultsResponse,
            crate::dto::room::PlayerPayoutSummary,
            crate::dto::sse::RoomChangedEvent,
            crate::dto::sse::RoomClosedEvent,
            crate::dao::models::RoomPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "room", description = "Room creation, joining, and snapshots"),
        (name = "game", description = "Round lifecycle operations"),
        (name = "sse", description = "Per-room change-feed streams"),
    )
)]
pub struct ApiDoc;
