//! End-to-end room lifecycle tests running the services against the
//! in-memory store.

use std::sync::Arc;

use uuid::Uuid;

use blind_pool_back::{
    config::AppConfig,
    dao::{models::RoomPhase, room_store::memory::MemoryRoomStore},
    dto::room::{CreateRoomRequest, InvestRequest, JoinRoomRequest, LeaveRequest},
    error::ServiceError,
    services::{game_service, lobby_service},
    state::{AppState, SharedState},
};

async fn test_state() -> SharedState {
    let state = AppState::new(AppConfig::default());
    state
        .set_room_store(Arc::new(MemoryRoomStore::new()))
        .await;
    state
}

/// Create a room with `extra` additional players and return the room id plus
/// player ids in join order (host first).
async fn seed_room(state: &SharedState, extra: usize) -> (String, Vec<Uuid>) {
    let created = lobby_service::create_room(
        state,
        CreateRoomRequest {
            name: "host".into(),
        },
    )
    .await
    .unwrap();

    let room_id = created.room.id.clone();
    let mut players = vec![created.player.id];

    for index in 0..extra {
        let joined = lobby_service::join_room(
            state,
            room_id.clone(),
            JoinRoomRequest {
                name: format!("player{}", index + 2),
            },
        )
        .await
        .unwrap();
        players.push(joined.player.id);
    }

    (room_id, players)
}

fn invest(player_id: Uuid, asset_a: u32, asset_b: u32) -> InvestRequest {
    InvestRequest {
        player_id,
        asset_a,
        asset_b,
    }
}

fn leave(player_id: Uuid) -> LeaveRequest {
    LeaveRequest {
        player_id,
        actor_id: None,
    }
}

async fn phase(state: &SharedState, room_id: &str) -> Option<RoomPhase> {
    let store = state.room_store().await.unwrap();
    store
        .find_room(room_id.to_owned())
        .await
        .unwrap()
        .map(|room| room.state)
}

#[tokio::test]
async fn full_round_reaches_results_with_correct_payouts() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 1).await;

    game_service::start_game(&state, room_id.clone(), players[0])
        .await
        .unwrap();
    assert_eq!(
        phase(&state, &room_id).await,
        Some(RoomPhase::CollectingInvestments)
    );

    game_service::submit_investment(&state, room_id.clone(), invest(players[0], 60, 40))
        .await
        .unwrap();
    assert_eq!(
        phase(&state, &room_id).await,
        Some(RoomPhase::CollectingInvestments)
    );

    game_service::submit_investment(&state, room_id.clone(), invest(players[1], 100, 0))
        .await
        .unwrap();
    assert_eq!(phase(&state, &room_id).await, Some(RoomPhase::ResultsReady));

    let results = game_service::results(&state, room_id.clone()).await.unwrap();
    assert_eq!(results.b_total, 40);
    assert_eq!(results.b_increased, 60.0);
    assert_eq!(results.equal_share, 30.0);
    assert_eq!(results.players[0].final_payout, 130.0);
    assert_eq!(results.players[1].final_payout, 90.0);
}

#[tokio::test]
async fn unanimous_restart_votes_reset_the_room() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 1).await;

    game_service::start_game(&state, room_id.clone(), players[0])
        .await
        .unwrap();
    for &player in &players {
        game_service::submit_investment(&state, room_id.clone(), invest(player, 50, 50))
            .await
            .unwrap();
    }
    assert_eq!(phase(&state, &room_id).await, Some(RoomPhase::ResultsReady));

    let first = game_service::play_again(&state, room_id.clone(), players[0])
        .await
        .unwrap();
    assert!(!first.restarted);
    assert_eq!(phase(&state, &room_id).await, Some(RoomPhase::ResultsReady));

    let second = game_service::play_again(&state, room_id.clone(), players[1])
        .await
        .unwrap();
    assert!(second.restarted);
    assert_eq!(
        phase(&state, &room_id).await,
        Some(RoomPhase::WaitingForPlayers)
    );

    // Round state is wiped for the next game.
    let store = state.room_store().await.unwrap();
    for player in store.list_players(room_id).await.unwrap() {
        assert!(!player.has_submitted);
        assert_eq!(player.asset_a, None);
        assert_eq!(player.asset_b, None);
    }
}

#[tokio::test]
async fn host_departure_promotes_the_earliest_remaining_joiner() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 2).await;

    game_service::start_game(&state, room_id.clone(), players[0])
        .await
        .unwrap();

    let outcome = game_service::leave_or_kick(&state, room_id.clone(), leave(players[0]))
        .await
        .unwrap();
    assert!(outcome.success);
    assert!(!outcome.closed);

    // Still collecting: two players remain and neither has submitted.
    assert_eq!(
        phase(&state, &room_id).await,
        Some(RoomPhase::CollectingInvestments)
    );

    let store = state.room_store().await.unwrap();
    let roster = store.list_players(room_id).await.unwrap();
    assert_eq!(roster.len(), 2);
    assert!(roster[0].is_host, "earliest joiner inherits the host role");
    assert!(!roster[1].is_host);
    assert_eq!(roster[0].id, players[1]);
}

#[tokio::test]
async fn departure_of_the_last_pending_player_completes_the_round() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 2).await;

    game_service::start_game(&state, room_id.clone(), players[0])
        .await
        .unwrap();
    game_service::submit_investment(&state, room_id.clone(), invest(players[0], 70, 30))
        .await
        .unwrap();
    game_service::submit_investment(&state, room_id.clone(), invest(players[1], 20, 80))
        .await
        .unwrap();

    // The third player never submits and walks out.
    let outcome = game_service::leave_or_kick(&state, room_id.clone(), leave(players[2]))
        .await
        .unwrap();
    assert!(outcome.success);
    assert!(!outcome.closed);
    assert_eq!(phase(&state, &room_id).await, Some(RoomPhase::ResultsReady));

    // Ready bits are recycled for restart votes; allocations survive for the
    // payout.
    let store = state.room_store().await.unwrap();
    for player in store.list_players(room_id.clone()).await.unwrap() {
        assert!(!player.has_submitted);
        assert!(player.asset_a.is_some());
    }

    let results = game_service::results(&state, room_id).await.unwrap();
    assert_eq!(results.b_total, 110);
    assert_eq!(results.players.len(), 2);
}

#[tokio::test]
async fn lone_survivor_mid_collection_goes_back_to_the_lobby() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 1).await;

    game_service::start_game(&state, room_id.clone(), players[0])
        .await
        .unwrap();
    game_service::submit_investment(&state, room_id.clone(), invest(players[1], 50, 50))
        .await
        .unwrap();

    let outcome = game_service::leave_or_kick(&state, room_id.clone(), leave(players[0]))
        .await
        .unwrap();
    assert!(outcome.terminated, "round is aborted, not completed");
    assert_eq!(
        phase(&state, &room_id).await,
        Some(RoomPhase::WaitingForPlayers)
    );

    let store = state.room_store().await.unwrap();
    let roster = store.list_players(room_id).await.unwrap();
    assert_eq!(roster.len(), 1);
    assert!(roster[0].is_host);
    assert!(!roster[0].has_submitted);
    assert_eq!(roster[0].asset_b, None, "submission wiped by the reset");
}

#[tokio::test]
async fn emptying_a_room_deletes_it() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 1).await;

    let first = game_service::leave_or_kick(&state, room_id.clone(), leave(players[1]))
        .await
        .unwrap();
    assert!(!first.closed);

    let last = game_service::leave_or_kick(&state, room_id.clone(), leave(players[0]))
        .await
        .unwrap();
    assert!(last.closed);
    assert_eq!(phase(&state, &room_id).await, None);
}

#[tokio::test]
async fn any_departure_during_results_tears_the_room_down() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 2).await;

    game_service::start_game(&state, room_id.clone(), players[0])
        .await
        .unwrap();
    for &player in &players {
        game_service::submit_investment(&state, room_id.clone(), invest(player, 50, 50))
            .await
            .unwrap();
    }
    assert_eq!(phase(&state, &room_id).await, Some(RoomPhase::ResultsReady));

    let outcome = game_service::leave_or_kick(&state, room_id.clone(), leave(players[1]))
        .await
        .unwrap();
    assert!(outcome.closed);
    assert_eq!(phase(&state, &room_id).await, None);

    let store = state.room_store().await.unwrap();
    assert!(store.list_players(room_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn host_can_kick_but_others_cannot() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 2).await;

    let forbidden = game_service::leave_or_kick(
        &state,
        room_id.clone(),
        LeaveRequest {
            player_id: players[2],
            actor_id: Some(players[1]),
        },
    )
    .await;
    assert!(matches!(forbidden, Err(ServiceError::Unauthorized(_))));

    let kicked = game_service::leave_or_kick(
        &state,
        room_id.clone(),
        LeaveRequest {
            player_id: players[2],
            actor_id: Some(players[0]),
        },
    )
    .await
    .unwrap();
    assert!(kicked.success);

    let store = state.room_store().await.unwrap();
    assert_eq!(store.list_players(room_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn start_requires_the_host_and_a_quorum() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 1).await;

    let not_host = game_service::start_game(&state, room_id.clone(), players[1]).await;
    assert!(matches!(not_host, Err(ServiceError::Unauthorized(_))));

    game_service::leave_or_kick(&state, room_id.clone(), leave(players[1]))
        .await
        .unwrap();
    let too_few = game_service::start_game(&state, room_id.clone(), players[0]).await;
    assert!(matches!(too_few, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn allocations_must_spend_the_whole_budget() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 1).await;

    game_service::start_game(&state, room_id.clone(), players[0])
        .await
        .unwrap();

    let short = game_service::submit_investment(&state, room_id.clone(), invest(players[0], 40, 40))
        .await;
    assert!(matches!(short, Err(ServiceError::InvalidInput(_))));

    let over =
        game_service::submit_investment(&state, room_id.clone(), invest(players[0], 60, 60)).await;
    assert!(matches!(over, Err(ServiceError::InvalidInput(_))));

    game_service::submit_investment(&state, room_id.clone(), invest(players[0], 0, 100))
        .await
        .unwrap();
    let twice =
        game_service::submit_investment(&state, room_id.clone(), invest(players[0], 0, 100)).await;
    assert!(matches!(twice, Err(ServiceError::InvalidState(_))));
}

#[tokio::test]
async fn joining_is_refused_once_started_or_full() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 3).await;

    let full = lobby_service::join_room(
        &state,
        room_id.clone(),
        JoinRoomRequest {
            name: "fifth".into(),
        },
    )
    .await;
    assert!(matches!(full, Err(ServiceError::InvalidState(_))));

    game_service::leave_or_kick(&state, room_id.clone(), leave(players[3]))
        .await
        .unwrap();
    game_service::start_game(&state, room_id.clone(), players[0])
        .await
        .unwrap();

    let late = lobby_service::join_room(
        &state,
        room_id,
        JoinRoomRequest {
            name: "late".into(),
        },
    )
    .await;
    assert!(matches!(late, Err(ServiceError::InvalidState(_))));
}

#[tokio::test]
async fn simultaneous_final_submissions_transition_exactly_once() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 2).await;

    game_service::start_game(&state, room_id.clone(), players[0])
        .await
        .unwrap();
    game_service::submit_investment(&state, room_id.clone(), invest(players[0], 50, 50))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        game_service::submit_investment(&state, room_id.clone(), invest(players[1], 30, 70)),
        game_service::submit_investment(&state, room_id.clone(), invest(players[2], 80, 20)),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(phase(&state, &room_id).await, Some(RoomPhase::ResultsReady));
    let results = game_service::results(&state, room_id).await.unwrap();
    assert_eq!(results.b_total, 140);
}

#[tokio::test]
async fn simultaneous_departures_leave_exactly_one_host() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 3).await;

    let (a, b) = tokio::join!(
        game_service::leave_or_kick(&state, room_id.clone(), leave(players[0])),
        game_service::leave_or_kick(&state, room_id.clone(), leave(players[2])),
    );
    a.unwrap();
    b.unwrap();

    let store = state.room_store().await.unwrap();
    let roster = store.list_players(room_id).await.unwrap();
    assert_eq!(roster.len(), 2);
    let hosts = roster.iter().filter(|player| player.is_host).count();
    assert_eq!(hosts, 1, "host role must land on exactly one survivor");
}

#[tokio::test]
async fn start_racing_a_departure_settles_back_in_the_lobby() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 1).await;

    // Either order converges: leave-first makes the start fail its fresh
    // roster check (rolling back its transition if needed), start-first
    // leaves a lone collector whose departure handler resets the room.
    let (start, left) = tokio::join!(
        game_service::start_game(&state, room_id.clone(), players[0]),
        game_service::leave_or_kick(&state, room_id.clone(), leave(players[1])),
    );
    left.unwrap();
    let _ = start;

    assert_eq!(
        phase(&state, &room_id).await,
        Some(RoomPhase::WaitingForPlayers)
    );

    let store = state.room_store().await.unwrap();
    let roster = store.list_players(room_id).await.unwrap();
    assert_eq!(roster.len(), 1);
    assert!(roster[0].is_host);
    assert!(!roster[0].has_submitted);
}

#[tokio::test]
async fn duplicate_departure_is_an_idempotent_success() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 2).await;

    let first = game_service::leave_or_kick(&state, room_id.clone(), leave(players[1]))
        .await
        .unwrap();
    assert!(!first.already_removed);

    let second = game_service::leave_or_kick(&state, room_id.clone(), leave(players[1]))
        .await
        .unwrap();
    assert!(second.success);
    assert!(second.already_removed);

    let store = state.room_store().await.unwrap();
    assert_eq!(store.list_players(room_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn snapshot_returns_roster_in_join_order() {
    let state = test_state().await;
    let (room_id, players) = seed_room(&state, 2).await;

    let snapshot = lobby_service::room_snapshot(&state, room_id).await.unwrap();
    assert_eq!(snapshot.room.state, RoomPhase::WaitingForPlayers);
    let ids: Vec<Uuid> = snapshot.players.iter().map(|player| player.id).collect();
    assert_eq!(ids, players);
    assert!(snapshot.players[0].is_host);
}
