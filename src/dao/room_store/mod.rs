//! Abstraction over the persistence layer for rooms and players.
//!
//! Every mutation that participates in a lifecycle decision is expressed as a
//! conditional single-row write returning whether it applied. Backends must
//! guarantee row-level atomicity for these operations; no cross-row
//! transaction is assumed anywhere in the crate.

pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{PlayerEntity, RoomEntity, RoomPhase};
use crate::dao::storage::StorageResult;

/// Storage contract consumed by the lobby and game services.
pub trait RoomStore: Send + Sync {
    /// Insert a new room; returns `false` when the code is already taken.
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Point read of a room by its code.
    fn find_room(&self, id: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Compare-and-swap on the room phase: applies iff the current phase
    /// equals `from`. A `false` return means another writer got there first.
    fn transition_room(
        &self,
        id: String,
        from: RoomPhase,
        to: RoomPhase,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete a room row; `false` when it was already gone.
    fn delete_room(&self, id: String) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert a freshly joined player.
    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Point read of a player scoped to its room.
    fn find_player(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// All players of a room in join order (oldest first).
    fn list_players(&self, room_id: String)
    -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;

    /// Store an allocation and flip the ready bit, guarded on
    /// `has_submitted == false` so a duplicate submission cannot apply twice.
    fn record_investment(
        &self,
        room_id: String,
        player_id: Uuid,
        asset_a: u32,
        asset_b: u32,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Set the ready bit for a restart vote; `false` when the player row is
    /// missing. Re-setting an already set bit is a no-op success.
    fn mark_restart_vote(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Drop the host flag on every player of the room.
    fn clear_hosts(&self, room_id: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Grant the host flag to one player; `false` when the row is missing.
    fn promote_host(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Reset every player of the room to round-start values: ready bit off,
    /// both allocations cleared.
    fn reset_round(&self, room_id: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Clear only the ready bits, preserving allocations for the payout view.
    fn clear_submissions(&self, room_id: String) -> BoxFuture<'static, StorageResult<()>>;

    /// Delete one player; `false` when the row was already gone (deletes are
    /// idempotent at this layer).
    fn delete_player(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete every player of the room, returning how many rows went away.
    fn delete_players(&self, room_id: String) -> BoxFuture<'static, StorageResult<u64>>;

    /// Cheap connectivity probe used by the health endpoint and supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish the backend connection after a failed probe.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
