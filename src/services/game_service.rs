//! The room coordinator: the four lifecycle operations and their
//! concurrency-control protocol.
//!
//! No in-process lock serializes these handlers. Every state-changing write
//! is conditioned on the exact prior value it read (read, decide, write with
//! guard), so a write racing a concurrent transition simply fails to apply.
//! A no-op conditional write means "someone else already made this
//! transition" and is reported as success; the one exception is quorum,
//! which is always decided from a roster re-read *after* the triggering
//! write, never from data read before it.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, RoomEntity, RoomPhase},
    dto::room::{InvestRequest, LeaveRequest, LeaveResponse, PlayAgainResponse, ResultsResponse},
    error::ServiceError,
    services::{
        payout,
        roster::{self, DepartureOutcome},
        sse_events,
    },
    state::SharedState,
};

/// Host-only transition from the lobby into the collection phase.
///
/// A concurrent duplicate start loses the conditional write and is treated
/// as success: both callers observe the same end state.
pub async fn start_game(
    state: &SharedState,
    room_id: String,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;

    let room = require_room(state, &room_id).await?;
    if room.state != RoomPhase::WaitingForPlayers {
        return Err(ServiceError::InvalidState(
            "game has already started".into(),
        ));
    }

    let player = require_player(state, &room_id, player_id).await?;
    if !player.is_host {
        return Err(ServiceError::Unauthorized(
            "only the host can start the game".into(),
        ));
    }

    let min_players = state.config().rules().min_players;
    let roster = store.list_players(room_id.clone()).await?;
    if roster.len() < min_players {
        return Err(ServiceError::InvalidInput(format!(
            "need at least {min_players} players to start"
        )));
    }

    let applied = store
        .transition_room(
            room_id.clone(),
            RoomPhase::WaitingForPlayers,
            RoomPhase::CollectingInvestments,
        )
        .await?;
    if !applied {
        debug!(room_id, "start lost the transition race; already applied");
    }

    // The quorum was checked against a roster read before the transition. A
    // concurrent departure may have invalidated it, so verify against fresh
    // data and back out rather than leave a lone player collecting.
    let roster = store.list_players(room_id.clone()).await?;
    if roster.len() < min_players {
        let reverted = store
            .transition_room(
                room_id.clone(),
                RoomPhase::CollectingInvestments,
                RoomPhase::WaitingForPlayers,
            )
            .await?;
        if reverted {
            store.reset_round(room_id.clone()).await?;
        }
        warn!(room_id, "roster shrank below the quorum during start");
        return Err(ServiceError::InvalidInput(format!(
            "need at least {min_players} players to start"
        )));
    }

    info!(room_id, "game started");
    sse_events::notify_room_changed(state, &room_id, "game_started");
    Ok(())
}

/// Record one blind allocation; when it completes the quorum, move the room
/// to results.
pub async fn submit_investment(
    state: &SharedState,
    room_id: String,
    request: InvestRequest,
) -> Result<(), ServiceError> {
    let rules = state.config().rules();
    // Validated before any storage access. u32 inputs already exclude
    // negatives and fractions.
    if u64::from(request.asset_a) + u64::from(request.asset_b) != u64::from(rules.total_budget) {
        return Err(ServiceError::InvalidInput(format!(
            "investments must total {}",
            rules.total_budget
        )));
    }

    let store = state.require_room_store().await?;

    let room = require_room(state, &room_id).await?;
    if room.state != RoomPhase::CollectingInvestments {
        return Err(ServiceError::InvalidState(
            "game is not accepting investments".into(),
        ));
    }

    let player = require_player(state, &room_id, request.player_id).await?;
    if player.has_submitted {
        return Err(ServiceError::InvalidState(
            "investment already submitted".into(),
        ));
    }

    let applied = store
        .record_investment(
            room_id.clone(),
            request.player_id,
            request.asset_a,
            request.asset_b,
        )
        .await?;
    if !applied {
        // A duplicate of this request won the guard first; the earlier copy
        // carries the same payload, so this is a harmless replay.
        debug!(room_id, player_id = %request.player_id, "submission guard already satisfied");
    }

    sse_events::notify_room_changed(state, &room_id, "investment_submitted");
    try_complete_collection(state, &room_id).await?;
    Ok(())
}

/// Remove a player, either voluntarily or kicked by the host, then restore
/// the roster invariants and apply any phase consequence.
pub async fn leave_or_kick(
    state: &SharedState,
    room_id: String,
    request: LeaveRequest,
) -> Result<LeaveResponse, ServiceError> {
    let store = state.require_room_store().await?;
    require_room(state, &room_id).await?;

    if let Some(actor_id) = request.actor_id
        && actor_id != request.player_id
    {
        let actor = store.find_player(room_id.clone(), actor_id).await?;
        if !actor.is_some_and(|actor| actor.is_host) {
            return Err(ServiceError::Unauthorized(
                "only the host can kick players".into(),
            ));
        }
    }

    let Some(target) = store.find_player(room_id.clone(), request.player_id).await? else {
        // Duplicate leave racing a kick: the row is already gone, report
        // idempotent success with no further side effect.
        debug!(room_id, player_id = %request.player_id, "player already removed");
        return Ok(LeaveResponse {
            success: true,
            already_removed: true,
            ..Default::default()
        });
    };

    store.delete_player(room_id.clone(), target.id).await?;
    let remaining = store.list_players(room_id.clone()).await?;

    // The phase consequence must be decided from the phase as it stands
    // after our delete; the row read at the top may predate a concurrent
    // start or restart.
    let Some(room) = store.find_room(room_id.clone()).await? else {
        debug!(room_id, "room already torn down by a concurrent departure");
        return Ok(LeaveResponse {
            success: true,
            closed: true,
            ..Default::default()
        });
    };

    match roster::departure_outcome(room.state, &remaining) {
        DepartureOutcome::CloseEmptyRoom => {
            store.delete_room(room_id.clone()).await?;
            info!(room_id, "last player left; room closed");
            sse_events::notify_room_closed(state, &room_id);
            return Ok(LeaveResponse {
                success: true,
                closed: true,
                ..Default::default()
            });
        }
        DepartureOutcome::TearDownResults => {
            // A partial roster cannot produce a meaningful restart vote, so
            // results rooms do not survive any departure.
            store.delete_players(room_id.clone()).await?;
            store.delete_room(room_id.clone()).await?;
            info!(room_id, "departure during results; room torn down");
            sse_events::notify_room_closed(state, &room_id);
            return Ok(LeaveResponse {
                success: true,
                closed: true,
                ..Default::default()
            });
        }
        DepartureOutcome::ResetToLobby | DepartureOutcome::CompleteRound
        | DepartureOutcome::RosterOnly => {}
    }

    if target.is_host {
        reassign_host(state, &room_id, &remaining).await?;
    }

    let response = match roster::departure_outcome(room.state, &remaining) {
        DepartureOutcome::ResetToLobby => {
            let applied = store
                .transition_room(
                    room_id.clone(),
                    RoomPhase::CollectingInvestments,
                    RoomPhase::WaitingForPlayers,
                )
                .await?;
            if applied {
                store.reset_round(room_id.clone()).await?;
                info!(room_id, "round aborted; room reset to lobby");
            } else {
                debug!(room_id, "lobby reset lost the transition race");
            }
            LeaveResponse {
                success: true,
                terminated: true,
                ..Default::default()
            }
        }
        DepartureOutcome::CompleteRound => {
            let applied = store
                .transition_room(
                    room_id.clone(),
                    RoomPhase::CollectingInvestments,
                    RoomPhase::ResultsReady,
                )
                .await?;
            if applied {
                // Clear only the ready bits; allocations must survive this
                // transition because the payout is computed from them.
                store.clear_submissions(room_id.clone()).await?;
                info!(room_id, "departure completed the quorum; results ready");
            }
            LeaveResponse {
                success: true,
                ..Default::default()
            }
        }
        _ => LeaveResponse {
            success: true,
            ..Default::default()
        },
    };

    sse_events::notify_room_changed(state, &room_id, "player_left");
    Ok(response)
}

/// Register a restart vote; when every player voted, reset the round and
/// drop the room back into the lobby.
pub async fn play_again(
    state: &SharedState,
    room_id: String,
    player_id: Uuid,
) -> Result<PlayAgainResponse, ServiceError> {
    let store = state.require_room_store().await?;

    let room = require_room(state, &room_id).await?;
    if room.state != RoomPhase::ResultsReady {
        return Err(ServiceError::InvalidState(
            "play again is only available after results".into(),
        ));
    }

    // Re-voting just re-confirms the same bit; only a missing row is an
    // error.
    let marked = store.mark_restart_vote(room_id.clone(), player_id).await?;
    if !marked {
        return Err(ServiceError::NotFound(
            "player not found in this room".into(),
        ));
    }

    let roster = store.list_players(room_id.clone()).await?;
    let all_ready = !roster.is_empty() && roster.iter().all(|player| player.has_submitted);

    if !all_ready {
        sse_events::notify_room_changed(state, &room_id, "restart_vote");
        return Ok(PlayAgainResponse {
            success: true,
            restarted: false,
        });
    }

    store.reset_round(room_id.clone()).await?;
    let applied = store
        .transition_room(
            room_id.clone(),
            RoomPhase::ResultsReady,
            RoomPhase::WaitingForPlayers,
        )
        .await?;
    if !applied {
        debug!(room_id, "restart lost the transition race; already applied");
    }

    info!(room_id, "all players voted; room reset for a new round");
    sse_events::notify_room_changed(state, &room_id, "room_restarted");
    Ok(PlayAgainResponse {
        success: true,
        restarted: true,
    })
}

/// Ranked payout table for a finished round.
pub async fn results(
    state: &SharedState,
    room_id: String,
) -> Result<ResultsResponse, ServiceError> {
    let store = state.require_room_store().await?;

    let room = require_room(state, &room_id).await?;
    if room.state != RoomPhase::ResultsReady {
        return Err(ServiceError::InvalidState(
            "results are not ready for this room".into(),
        ));
    }

    let roster = store.list_players(room_id).await?;
    let table = payout::compute(&roster, state.config().rules().multiplier);
    Ok(table.into())
}

/// Re-read the roster and move the room to results when everyone submitted.
///
/// Two last-to-submit players may both reach this check; the transition
/// guard makes the second attempt a harmless no-op rather than a double
/// transition.
async fn try_complete_collection(state: &SharedState, room_id: &str) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;

    let roster = store.list_players(room_id.to_owned()).await?;
    if roster.is_empty() || !roster.iter().all(|player| player.has_submitted) {
        return Ok(());
    }

    let applied = store
        .transition_room(
            room_id.to_owned(),
            RoomPhase::CollectingInvestments,
            RoomPhase::ResultsReady,
        )
        .await?;
    if applied {
        info!(room_id, "all investments in; results ready");
        sse_events::notify_room_changed(state, room_id, "results_ready");
    } else {
        debug!(room_id, "quorum transition lost the race; already applied");
    }
    Ok(())
}

/// Clear every host flag, then promote the earliest remaining joiner.
///
/// Both writes target the post-delete roster. If a concurrent departure
/// changes the roster in between, the promote may miss; the next departure
/// re-runs reassignment off fresh data, so exactly one survivor ends up
/// host.
async fn reassign_host(
    state: &SharedState,
    room_id: &str,
    remaining: &[PlayerEntity],
) -> Result<(), ServiceError> {
    let store = state.require_room_store().await?;

    store.clear_hosts(room_id.to_owned()).await?;
    if let Some(successor) = roster::successor(remaining) {
        let promoted = store.promote_host(room_id.to_owned(), successor.id).await?;
        if promoted {
            info!(room_id, new_host = %successor.id, "host role reassigned");
        } else {
            warn!(room_id, candidate = %successor.id, "host successor vanished before promotion");
        }
    }
    Ok(())
}

async fn require_room(state: &SharedState, room_id: &str) -> Result<RoomEntity, ServiceError> {
    let store = state.require_room_store().await?;
    store
        .find_room(room_id.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))
}

async fn require_player(
    state: &SharedState,
    room_id: &str,
    player_id: Uuid,
) -> Result<PlayerEntity, ServiceError> {
    let store = state.require_room_store().await?;
    store
        .find_player(room_id.to_owned(), player_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("player not found in this room".into()))
}
