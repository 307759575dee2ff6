//! In-process room store used as the no-database fallback and by the test
//! suite. Conditional updates rely on the map's per-shard entry locks, which
//! gives the same single-row atomicity the service expects from a real
//! database.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{PlayerEntity, RoomEntity, RoomPhase};
use crate::dao::room_store::RoomStore;
use crate::dao::storage::StorageResult;

/// Dashmap-backed [`RoomStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    rooms: DashMap<String, RoomEntity>,
    players: DashMap<Uuid, PlayerEntity>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_room_sync(&self, room: RoomEntity) -> bool {
        match self.inner.rooms.entry(room.id.clone()) {
            dashmap::Entry::Occupied(_) => false,
            dashmap::Entry::Vacant(slot) => {
                slot.insert(room);
                true
            }
        }
    }

    fn transition_room_sync(&self, id: &str, from: RoomPhase, to: RoomPhase) -> bool {
        // The guard check and the write happen under the same shard lock.
        match self.inner.rooms.get_mut(id) {
            Some(mut room) if room.state == from => {
                room.state = to;
                true
            }
            _ => false,
        }
    }

    fn list_players_sync(&self, room_id: &str) -> Vec<PlayerEntity> {
        let mut players: Vec<PlayerEntity> = self
            .inner
            .players
            .iter()
            .filter(|entry| entry.room_id == room_id)
            .map(|entry| entry.clone())
            .collect();
        players.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        players
    }

    fn record_investment_sync(
        &self,
        room_id: &str,
        player_id: Uuid,
        asset_a: u32,
        asset_b: u32,
    ) -> bool {
        match self.inner.players.get_mut(&player_id) {
            Some(mut player) if player.room_id == room_id && !player.has_submitted => {
                player.asset_a = Some(asset_a);
                player.asset_b = Some(asset_b);
                player.has_submitted = true;
                true
            }
            _ => false,
        }
    }

    fn mark_restart_vote_sync(&self, room_id: &str, player_id: Uuid) -> bool {
        match self.inner.players.get_mut(&player_id) {
            Some(mut player) if player.room_id == room_id => {
                player.has_submitted = true;
                true
            }
            _ => false,
        }
    }

    fn update_room_players(&self, room_id: &str, mut apply: impl FnMut(&mut PlayerEntity)) {
        self.inner
            .players
            .iter_mut()
            .filter(|entry| entry.room_id == room_id)
            .for_each(|mut entry| apply(&mut entry));
    }

    fn delete_player_sync(&self, room_id: &str, player_id: Uuid) -> bool {
        self.inner
            .players
            .remove_if(&player_id, |_, player| player.room_id == room_id)
            .is_some()
    }

    fn delete_players_sync(&self, room_id: &str) -> u64 {
        let ids: Vec<Uuid> = self
            .inner
            .players
            .iter()
            .filter(|entry| entry.room_id == room_id)
            .map(|entry| entry.id)
            .collect();
        let mut removed = 0;
        for id in ids {
            if self
                .inner
                .players
                .remove_if(&id, |_, player| player.room_id == room_id)
                .is_some()
            {
                removed += 1;
            }
        }
        removed
    }
}

impl RoomStore for MemoryRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.insert_room_sync(room)) })
    }

    fn find_room(&self, id: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.rooms.get(&id).map(|room| room.clone())) })
    }

    fn transition_room(
        &self,
        id: String,
        from: RoomPhase,
        to: RoomPhase,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.transition_room_sync(&id, from, to)) })
    }

    fn delete_room(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.rooms.remove(&id).is_some()) })
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.players.insert(player.id, player);
            Ok(())
        })
    }

    fn find_player(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .players
                .get(&player_id)
                .filter(|player| player.room_id == room_id)
                .map(|player| player.clone()))
        })
    }

    fn list_players(
        &self,
        room_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_players_sync(&room_id)) })
    }

    fn record_investment(
        &self,
        room_id: String,
        player_id: Uuid,
        asset_a: u32,
        asset_b: u32,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store.record_investment_sync(&room_id, player_id, asset_a, asset_b))
        })
    }

    fn mark_restart_vote(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.mark_restart_vote_sync(&room_id, player_id)) })
    }

    fn clear_hosts(&self, room_id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.update_room_players(&room_id, |player| player.is_host = false);
            Ok(())
        })
    }

    fn promote_host(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.players.get_mut(&player_id) {
                Some(mut player) if player.room_id == room_id => {
                    player.is_host = true;
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn reset_round(&self, room_id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.update_room_players(&room_id, |player| {
                player.has_submitted = false;
                player.asset_a = None;
                player.asset_b = None;
            });
            Ok(())
        })
    }

    fn clear_submissions(&self, room_id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.update_room_players(&room_id, |player| player.has_submitted = false);
            Ok(())
        })
    }

    fn delete_player(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.delete_player_sync(&room_id, player_id)) })
    }

    fn delete_players(&self, room_id: String) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.delete_players_sync(&room_id)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn room(id: &str, state: RoomPhase) -> RoomEntity {
        RoomEntity {
            id: id.into(),
            state,
            created_at: SystemTime::now(),
        }
    }

    fn player(room_id: &str, name: &str, joined_offset_ms: u64) -> PlayerEntity {
        let mut player = PlayerEntity::new(room_id, name, false);
        player.created_at = SystemTime::UNIX_EPOCH + Duration::from_millis(joined_offset_ms);
        player
    }

    #[tokio::test]
    async fn insert_room_rejects_duplicate_code() {
        let store = MemoryRoomStore::new();
        assert!(
            store
                .insert_room(room("ABCDEF", RoomPhase::WaitingForPlayers))
                .await
                .unwrap()
        );
        assert!(
            !store
                .insert_room(room("ABCDEF", RoomPhase::WaitingForPlayers))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn transition_room_applies_only_when_guard_matches() {
        let store = MemoryRoomStore::new();
        store
            .insert_room(room("ROOM01", RoomPhase::WaitingForPlayers))
            .await
            .unwrap();

        let applied = store
            .transition_room(
                "ROOM01".into(),
                RoomPhase::WaitingForPlayers,
                RoomPhase::CollectingInvestments,
            )
            .await
            .unwrap();
        assert!(applied);

        // Second writer with the stale expectation loses.
        let applied = store
            .transition_room(
                "ROOM01".into(),
                RoomPhase::WaitingForPlayers,
                RoomPhase::CollectingInvestments,
            )
            .await
            .unwrap();
        assert!(!applied);

        let current = store.find_room("ROOM01".into()).await.unwrap().unwrap();
        assert_eq!(current.state, RoomPhase::CollectingInvestments);
    }

    #[tokio::test]
    async fn record_investment_guard_blocks_double_submit() {
        let store = MemoryRoomStore::new();
        let alice = player("ROOM01", "alice", 1);
        let id = alice.id;
        store.insert_player(alice).await.unwrap();

        assert!(
            store
                .record_investment("ROOM01".into(), id, 60, 40)
                .await
                .unwrap()
        );
        assert!(
            !store
                .record_investment("ROOM01".into(), id, 0, 100)
                .await
                .unwrap()
        );

        let stored = store
            .find_player("ROOM01".into(), id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.asset_a, Some(60));
        assert_eq!(stored.asset_b, Some(40));
        assert!(stored.has_submitted);
    }

    #[tokio::test]
    async fn list_players_orders_by_join_time() {
        let store = MemoryRoomStore::new();
        let late = player("ROOM01", "late", 300);
        let early = player("ROOM01", "early", 100);
        let other = player("ROOM02", "other", 50);
        store.insert_player(late).await.unwrap();
        store.insert_player(early).await.unwrap();
        store.insert_player(other).await.unwrap();

        let players = store.list_players("ROOM01".into()).await.unwrap();
        let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["early", "late"]);
    }

    #[tokio::test]
    async fn reset_round_clears_flags_and_assets() {
        let store = MemoryRoomStore::new();
        let mut alice = player("ROOM01", "alice", 1);
        alice.asset_a = Some(70);
        alice.asset_b = Some(30);
        alice.has_submitted = true;
        let id = alice.id;
        store.insert_player(alice).await.unwrap();

        store.reset_round("ROOM01".into()).await.unwrap();
        let stored = store
            .find_player("ROOM01".into(), id)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.has_submitted);
        assert_eq!(stored.asset_a, None);
        assert_eq!(stored.asset_b, None);
    }

    #[tokio::test]
    async fn delete_player_is_idempotent() {
        let store = MemoryRoomStore::new();
        let alice = player("ROOM01", "alice", 1);
        let id = alice.id;
        store.insert_player(alice).await.unwrap();

        assert!(store.delete_player("ROOM01".into(), id).await.unwrap());
        assert!(!store.delete_player("ROOM01".into(), id).await.unwrap());
    }
}
