use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle phase of a room. Only the game service mutates this value, and
/// only through guarded transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomPhase {
    /// Lobby: players can join, the host can start once enough are present.
    WaitingForPlayers,
    /// A round is running; each player submits one blind allocation.
    CollectingInvestments,
    /// Every allocation is in; the payout table can be derived.
    ResultsReady,
}

/// Room row persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Short shareable room code (primary key), immutable after creation.
    pub id: String,
    /// Current lifecycle phase.
    pub state: RoomPhase,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
}

/// Player row persisted by the storage layer.
///
/// The player id doubles as the bearer credential for the session; there is
/// no separate authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Primary key, assigned at join time.
    pub id: Uuid,
    /// Room this player belongs to for its whole lifetime.
    pub room_id: String,
    /// Display name (1-20 characters, not necessarily unique).
    pub name: String,
    /// Host flag; exactly one player per non-empty room carries it.
    pub is_host: bool,
    /// Safe-asset allocation; `None` until the player submits this round.
    pub asset_a: Option<u32>,
    /// Pool-asset allocation; set together with `asset_a`.
    pub asset_b: Option<u32>,
    /// Ready bit for the current phase: investment submitted while
    /// collecting, restart vote while showing results.
    pub has_submitted: bool,
    /// Join timestamp; ascending order defines host succession.
    pub created_at: SystemTime,
}

impl PlayerEntity {
    /// Build a fresh player row for the given room.
    pub fn new(room_id: impl Into<String>, name: impl Into<String>, is_host: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id: room_id.into(),
            name: name.into(),
            is_host,
            asset_a: None,
            asset_b: None,
            has_submitted: false,
            created_at: SystemTime::now(),
        }
    }
}
