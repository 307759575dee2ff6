//! Join flow: room creation, joining, and the snapshot read clients use to
//! re-derive their view after a change-feed notification.

use rand::Rng;
use std::time::SystemTime;
use tracing::info;

use crate::{
    dao::models::{PlayerEntity, RoomEntity, RoomPhase},
    dto::{
        room::{CreateRoomRequest, JoinRoomRequest, JoinedRoomResponse, RoomSnapshot},
        validation::{ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH, validate_room_code},
    },
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// How many fresh codes we try before giving up on a pathological collision
/// streak.
const ROOM_CODE_ATTEMPTS: usize = 5;

/// Create a room in the lobby phase together with its host player.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<JoinedRoomResponse, ServiceError> {
    let name = sanitize_name(&request.name)?;
    let store = state.require_room_store().await?;

    let mut attempts = 0;
    let room = loop {
        let room = RoomEntity {
            id: generate_room_code(),
            state: RoomPhase::WaitingForPlayers,
            created_at: SystemTime::now(),
        };
        if store.insert_room(room.clone()).await? {
            break room;
        }
        attempts += 1;
        if attempts >= ROOM_CODE_ATTEMPTS {
            return Err(ServiceError::InvalidState(
                "could not allocate a unique room code".into(),
            ));
        }
    };

    let host = PlayerEntity::new(room.id.clone(), name, true);
    store.insert_player(host.clone()).await?;

    info!(room_id = %room.id, player_id = %host.id, "room created");
    Ok(JoinedRoomResponse {
        room: room.into(),
        player: host.into(),
    })
}

/// Join an existing lobby-phase room as a non-host player.
pub async fn join_room(
    state: &SharedState,
    room_id: String,
    request: JoinRoomRequest,
) -> Result<JoinedRoomResponse, ServiceError> {
    let name = sanitize_name(&request.name)?;
    let room_id = normalize_room_code(&room_id)?;
    let store = state.require_room_store().await?;

    let Some(room) = store.find_room(room_id.clone()).await? else {
        return Err(ServiceError::NotFound(format!(
            "room `{room_id}` not found"
        )));
    };

    if room.state != RoomPhase::WaitingForPlayers {
        return Err(ServiceError::InvalidState(
            "this game has already started".into(),
        ));
    }

    let max_players = state.config().rules().max_players;
    let roster = store.list_players(room_id.clone()).await?;
    if roster.len() >= max_players {
        return Err(ServiceError::InvalidState(format!(
            "room is full (max {max_players} players)"
        )));
    }

    let player = PlayerEntity::new(room_id.clone(), name, false);
    store.insert_player(player.clone()).await?;

    info!(room_id = %room_id, player_id = %player.id, "player joined");
    sse_events::notify_room_changed(state, &room_id, "player_joined");

    Ok(JoinedRoomResponse {
        room: room.into(),
        player: player.into(),
    })
}

/// Full current state of a room: the row plus the roster in join order.
pub async fn room_snapshot(
    state: &SharedState,
    room_id: String,
) -> Result<RoomSnapshot, ServiceError> {
    let room_id = normalize_room_code(&room_id)?;
    let store = state.require_room_store().await?;

    let Some(room) = store.find_room(room_id.clone()).await? else {
        return Err(ServiceError::NotFound(format!(
            "room `{room_id}` not found"
        )));
    };
    let players = store.list_players(room_id).await?;

    Ok(RoomSnapshot {
        room: room.into(),
        players: players.into_iter().map(Into::into).collect(),
    })
}

/// Uppercase a client-supplied room code and check it against the alphabet.
pub fn normalize_room_code(raw: &str) -> Result<String, ServiceError> {
    let code = raw.trim().to_ascii_uppercase();
    validate_room_code(&code)
        .map_err(|err| ServiceError::InvalidInput(format!("invalid room code: {err}")))?;
    Ok(code)
}

fn sanitize_name(raw: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > 20 {
        return Err(ServiceError::InvalidInput(
            "display name must be 1-20 characters".into(),
        ));
    }
    Ok(name.to_owned())
}

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| {
            let index = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[index] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_pass_validation() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert!(validate_room_code(&code).is_ok(), "bad code `{code}`");
        }
    }

    #[test]
    fn normalize_accepts_lowercase_input() {
        assert_eq!(normalize_room_code(" abcdef ").unwrap(), "ABCDEF");
        assert!(normalize_room_code("ab").is_err());
    }

    #[test]
    fn sanitize_name_rejects_blank_and_oversized() {
        assert!(sanitize_name("   ").is_err());
        assert!(sanitize_name(&"x".repeat(21)).is_err());
        assert_eq!(sanitize_name("  alice ").unwrap(), "alice");
    }
}
