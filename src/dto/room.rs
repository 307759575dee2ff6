use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{PlayerEntity, RoomEntity, RoomPhase},
    dto::format_system_time,
    services::payout::{PayoutTable, PlayerPayout},
};

/// Payload used to create a room together with its host player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Display name of the creating player.
    #[validate(length(min = 1, max = 20, message = "name must be 1-20 characters"))]
    pub name: String,
}

/// Payload used to join an existing room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Display name of the joining player.
    #[validate(length(min = 1, max = 20, message = "name must be 1-20 characters"))]
    pub name: String,
}

/// Host request to start the round.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartGameRequest {
    /// Bearer player id of the caller; must be the host.
    pub player_id: Uuid,
}

/// One blind allocation submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InvestRequest {
    /// Bearer player id of the caller.
    pub player_id: Uuid,
    /// Amount kept in the safe asset.
    pub asset_a: u32,
    /// Amount contributed to the shared pool.
    pub asset_b: u32,
}

/// Self-departure or host-initiated removal.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaveRequest {
    /// Player to remove from the room.
    pub player_id: Uuid,
    /// Caller identity when kicking someone else; omitted for self-leave.
    #[serde(default)]
    pub actor_id: Option<Uuid>,
}

/// Restart vote after results.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayAgainRequest {
    /// Bearer player id of the voter.
    pub player_id: Uuid,
}

/// Public projection of a room row.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomSummary {
    /// Shareable room code.
    pub id: String,
    /// Current lifecycle phase.
    pub state: RoomPhase,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<RoomEntity> for RoomSummary {
    fn from(room: RoomEntity) -> Self {
        Self {
            id: room.id,
            state: room.state,
            created_at: format_system_time(room.created_at),
        }
    }
}

/// Public projection of a player row.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Player id; doubles as the bearer credential for its owner.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Whether this player currently holds the host role.
    pub is_host: bool,
    /// Safe-asset allocation, if submitted this round.
    pub asset_a: Option<u32>,
    /// Pool-asset allocation, if submitted this round.
    pub asset_b: Option<u32>,
    /// Ready bit for the current phase.
    pub has_submitted: bool,
    /// RFC 3339 join timestamp.
    pub created_at: String,
}

impl From<PlayerEntity> for PlayerSummary {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player.id,
            name: player.name,
            is_host: player.is_host,
            asset_a: player.asset_a,
            asset_b: player.asset_b,
            has_submitted: player.has_submitted,
            created_at: format_system_time(player.created_at),
        }
    }
}

/// Full room state returned by the snapshot endpoint; clients re-derive
/// their entire view from this after every change-feed notification.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomSnapshot {
    /// The room row.
    pub room: RoomSummary,
    /// Roster in join order.
    pub players: Vec<PlayerSummary>,
}

/// Returned after creating or joining a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinedRoomResponse {
    /// The room that was created or joined.
    pub room: RoomSummary,
    /// The caller's own player row, including the bearer id.
    pub player: PlayerSummary,
}

/// Generic acknowledgement for operations without extra outcome flags.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Always true on the success path.
    pub success: bool,
}

impl ActionResponse {
    /// Successful acknowledgement.
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Outcome of a leave or kick request.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct LeaveResponse {
    /// Always true; failures surface as errors instead.
    pub success: bool,
    /// The player was already gone (duplicate request).
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_removed: bool,
    /// The room was deleted as part of handling the departure.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub closed: bool,
    /// The round was aborted and the room reset to the lobby.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub terminated: bool,
}

/// Outcome of a restart vote.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayAgainResponse {
    /// Always true on the success path.
    pub success: bool,
    /// Whether this vote completed the quorum and reset the room.
    pub restarted: bool,
}

/// Ranked payout table served once a room reaches results.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsResponse {
    /// Sum of all pool contributions.
    pub b_total: u32,
    /// Pool after applying the growth multiplier.
    pub b_increased: f64,
    /// Even share of the grown pool.
    pub equal_share: f64,
    /// Per-player payouts, highest first.
    pub players: Vec<PlayerPayoutSummary>,
}

/// One row of the payout table.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerPayoutSummary {
    /// Display name.
    pub name: String,
    /// Safe-asset allocation used for the payout.
    pub asset_a: u32,
    /// Pool contribution used for the payout.
    pub asset_b: u32,
    /// Final payout: safe asset plus the equal share.
    pub final_payout: f64,
}

impl From<PlayerPayout> for PlayerPayoutSummary {
    fn from(payout: PlayerPayout) -> Self {
        Self {
            name: payout.name,
            asset_a: payout.asset_a,
            asset_b: payout.asset_b,
            final_payout: payout.final_payout,
        }
    }
}

impl From<PayoutTable> for ResultsResponse {
    fn from(table: PayoutTable) -> Self {
        Self {
            b_total: table.pool_total,
            b_increased: table.pool_grown,
            equal_share: table.equal_share,
            players: table.players.into_iter().map(Into::into).collect(),
        }
    }
}
