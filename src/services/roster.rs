//! Roster maintenance rules applied after a player departure.
//!
//! [`departure_outcome`] is the room-level transition table in one place:
//! given the phase the room was in and the freshly re-read remaining roster,
//! it decides what the departure handler must do next. Keeping it pure makes
//! the rules auditable independently of the storage plumbing.

use crate::dao::models::{PlayerEntity, RoomPhase};

/// What the departure handler must do after deleting a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureOutcome {
    /// Roster is empty: delete the room, nothing else remains.
    CloseEmptyRoom,
    /// Results-phase rooms do not survive any departure: delete the room and
    /// every remaining player.
    TearDownResults,
    /// Only one player is left mid-collection; a round cannot continue with
    /// a single participant, so the room drops back to the lobby and all
    /// submissions reset.
    ResetToLobby,
    /// The departing player was the last one pending; the remaining roster
    /// is fully submitted and the room moves to results.
    CompleteRound,
    /// The roster shrank but the room phase is unaffected.
    RosterOnly,
}

/// Decide the room-level consequence of a departure.
///
/// `remaining` must be the roster re-read *after* the delete, in join order.
pub fn departure_outcome(phase: RoomPhase, remaining: &[PlayerEntity]) -> DepartureOutcome {
    if remaining.is_empty() {
        return DepartureOutcome::CloseEmptyRoom;
    }

    if phase == RoomPhase::ResultsReady {
        return DepartureOutcome::TearDownResults;
    }

    if phase == RoomPhase::CollectingInvestments {
        // Checked before the quorum: a lone submitted player goes back to
        // the lobby instead of straight to results.
        if remaining.len() == 1 {
            return DepartureOutcome::ResetToLobby;
        }
        if remaining.iter().all(|player| player.has_submitted) {
            return DepartureOutcome::CompleteRound;
        }
    }

    DepartureOutcome::RosterOnly
}

/// The player inheriting the host role: the earliest remaining joiner.
pub fn successor(remaining: &[PlayerEntity]) -> Option<&PlayerEntity> {
    remaining.first()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn player(name: &str, joined_offset_ms: u64, has_submitted: bool) -> PlayerEntity {
        let mut player = PlayerEntity::new("ROOM01", name, false);
        player.created_at = SystemTime::UNIX_EPOCH + Duration::from_millis(joined_offset_ms);
        player.has_submitted = has_submitted;
        player
    }

    #[test]
    fn empty_roster_closes_the_room() {
        assert_eq!(
            departure_outcome(RoomPhase::WaitingForPlayers, &[]),
            DepartureOutcome::CloseEmptyRoom
        );
        assert_eq!(
            departure_outcome(RoomPhase::CollectingInvestments, &[]),
            DepartureOutcome::CloseEmptyRoom
        );
    }

    #[test]
    fn any_departure_tears_down_a_results_room() {
        let remaining = [player("a", 1, false), player("b", 2, true)];
        assert_eq!(
            departure_outcome(RoomPhase::ResultsReady, &remaining),
            DepartureOutcome::TearDownResults
        );
    }

    #[test]
    fn lone_survivor_mid_collection_resets_to_lobby() {
        // Even a survivor who already submitted goes back to the lobby.
        let remaining = [player("a", 1, true)];
        assert_eq!(
            departure_outcome(RoomPhase::CollectingInvestments, &remaining),
            DepartureOutcome::ResetToLobby
        );
    }

    #[test]
    fn departure_of_last_pending_player_completes_the_round() {
        let remaining = [
            player("a", 1, true),
            player("b", 2, true),
            player("c", 3, true),
        ];
        assert_eq!(
            departure_outcome(RoomPhase::CollectingInvestments, &remaining),
            DepartureOutcome::CompleteRound
        );
    }

    #[test]
    fn pending_players_keep_the_room_collecting() {
        let remaining = [player("a", 1, true), player("b", 2, false)];
        assert_eq!(
            departure_outcome(RoomPhase::CollectingInvestments, &remaining),
            DepartureOutcome::RosterOnly
        );
    }

    #[test]
    fn lobby_departures_never_change_the_phase() {
        let remaining = [player("a", 1, false)];
        assert_eq!(
            departure_outcome(RoomPhase::WaitingForPlayers, &remaining),
            DepartureOutcome::RosterOnly
        );
    }

    #[test]
    fn successor_is_the_earliest_remaining_joiner() {
        let remaining = [player("early", 10, false), player("late", 20, false)];
        assert_eq!(successor(&remaining).unwrap().name, "early");
        assert!(successor(&[]).is_none());
    }
}
