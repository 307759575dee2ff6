use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{PlayerEntity, RoomEntity, RoomPhase};

/// Wire value stored in the `state` field of room documents.
pub fn phase_str(phase: RoomPhase) -> &'static str {
    match phase {
        RoomPhase::WaitingForPlayers => "WAITING_FOR_PLAYERS",
        RoomPhase::CollectingInvestments => "COLLECTING_INVESTMENTS",
        RoomPhase::ResultsReady => "RESULTS_READY",
    }
}

fn parse_phase(value: &str) -> RoomPhase {
    match value {
        "COLLECTING_INVESTMENTS" => RoomPhase::CollectingInvestments,
        "RESULTS_READY" => RoomPhase::ResultsReady,
        // Unknown values fall back to the lobby rather than poisoning reads.
        _ => RoomPhase::WaitingForPlayers,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomDocument {
    #[serde(rename = "_id")]
    id: String,
    state: String,
    created_at: DateTime,
}

impl From<RoomEntity> for MongoRoomDocument {
    fn from(value: RoomEntity) -> Self {
        Self {
            id: value.id,
            state: phase_str(value.state).to_owned(),
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoRoomDocument> for RoomEntity {
    fn from(value: MongoRoomDocument) -> Self {
        Self {
            id: value.id,
            state: parse_phase(&value.state),
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    id: String,
    room_id: String,
    name: String,
    is_host: bool,
    asset_a: Option<u32>,
    asset_b: Option<u32>,
    has_submitted: bool,
    created_at: DateTime,
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id.to_string(),
            room_id: value.room_id,
            name: value.name,
            is_host: value.is_host,
            asset_a: value.asset_a,
            asset_b: value.asset_b,
            has_submitted: value.has_submitted,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoPlayerDocument> for PlayerEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlayerDocument) -> MongoResult<Self> {
        let id = Uuid::parse_str(&value.id).map_err(|source| MongoDaoError::InvalidPlayerId {
            value: value.id.clone(),
            source,
        })?;

        Ok(Self {
            id,
            room_id: value.room_id,
            name: value.name,
            is_host: value.is_host,
            asset_a: value.asset_a,
            asset_b: value.asset_b,
            has_submitted: value.has_submitted,
            created_at: value.created_at.to_system_time(),
        })
    }
}
