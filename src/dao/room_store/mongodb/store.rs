use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database,
    bson::{Bson, doc},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoPlayerDocument, MongoRoomDocument, phase_str},
};
use crate::dao::{
    models::{PlayerEntity, RoomEntity, RoomPhase},
    room_store::RoomStore,
    storage::StorageResult,
};

const ROOM_COLLECTION_NAME: &str = "rooms";
const PLAYER_COLLECTION_NAME: &str = "players";

/// MongoDB implementation of the room store.
#[derive(Clone)]
pub struct MongoRoomStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.database = database;
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

impl MongoRoomStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.player_collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"room_id": 1, "created_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("player_room_join_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PLAYER_COLLECTION_NAME,
                index: "room_id,created_at",
                source,
            })?;

        Ok(())
    }

    async fn room_collection(&self) -> Collection<MongoRoomDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoRoomDocument>(ROOM_COLLECTION_NAME)
    }

    async fn player_collection(&self) -> Collection<MongoPlayerDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoPlayerDocument>(PLAYER_COLLECTION_NAME)
    }

    async fn insert_room(&self, room: RoomEntity) -> MongoResult<bool> {
        let id = room.id.clone();
        let document: MongoRoomDocument = room.into();
        let collection = self.room_collection().await;

        match collection.insert_one(&document).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::Room {
                operation: "insert",
                id,
                source,
            }),
        }
    }

    async fn find_room(&self, id: String) -> MongoResult<Option<RoomEntity>> {
        let collection = self.room_collection().await;
        let document = collection
            .find_one(doc! {"_id": &id})
            .await
            .map_err(|source| MongoDaoError::Room {
                operation: "load",
                id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn transition_room(
        &self,
        id: String,
        from: RoomPhase,
        to: RoomPhase,
    ) -> MongoResult<bool> {
        let collection = self.room_collection().await;
        let result = collection
            .update_one(
                doc! {"_id": &id, "state": phase_str(from)},
                doc! {"$set": {"state": phase_str(to)}},
            )
            .await
            .map_err(|source| MongoDaoError::Room {
                operation: "transition",
                id,
                source,
            })?;
        Ok(result.modified_count > 0)
    }

    async fn delete_room(&self, id: String) -> MongoResult<bool> {
        let collection = self.room_collection().await;
        let result = collection
            .delete_one(doc! {"_id": &id})
            .await
            .map_err(|source| MongoDaoError::Room {
                operation: "delete",
                id,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_player(&self, player: PlayerEntity) -> MongoResult<()> {
        let room_id = player.room_id.clone();
        let document: MongoPlayerDocument = player.into();
        let collection = self.player_collection().await;
        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "insert",
                room_id,
                source,
            })?;
        Ok(())
    }

    async fn find_player(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> MongoResult<Option<PlayerEntity>> {
        let collection = self.player_collection().await;
        let document = collection
            .find_one(doc! {"_id": player_id.to_string(), "room_id": &room_id})
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "load",
                room_id,
                source,
            })?;
        document.map(TryInto::try_into).transpose()
    }

    async fn list_players(&self, room_id: String) -> MongoResult<Vec<PlayerEntity>> {
        let collection = self.player_collection().await;
        let documents: Vec<MongoPlayerDocument> = collection
            .find(doc! {"room_id": &room_id})
            .sort(doc! {"created_at": 1, "_id": 1})
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "list",
                room_id: room_id.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "list",
                room_id,
                source,
            })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn record_investment(
        &self,
        room_id: String,
        player_id: Uuid,
        asset_a: u32,
        asset_b: u32,
    ) -> MongoResult<bool> {
        let collection = self.player_collection().await;
        let result = collection
            .update_one(
                doc! {
                    "_id": player_id.to_string(),
                    "room_id": &room_id,
                    "has_submitted": false,
                },
                doc! {"$set": {
                    "asset_a": asset_a as i64,
                    "asset_b": asset_b as i64,
                    "has_submitted": true,
                }},
            )
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "record_investment",
                room_id,
                source,
            })?;
        Ok(result.modified_count > 0)
    }

    async fn mark_restart_vote(&self, room_id: String, player_id: Uuid) -> MongoResult<bool> {
        let collection = self.player_collection().await;
        let result = collection
            .update_one(
                doc! {"_id": player_id.to_string(), "room_id": &room_id},
                doc! {"$set": {"has_submitted": true}},
            )
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "mark_restart_vote",
                room_id,
                source,
            })?;
        // Matched (not modified): re-voting is a no-op success.
        Ok(result.matched_count > 0)
    }

    async fn clear_hosts(&self, room_id: String) -> MongoResult<()> {
        let collection = self.player_collection().await;
        collection
            .update_many(
                doc! {"room_id": &room_id},
                doc! {"$set": {"is_host": false}},
            )
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "clear_hosts",
                room_id,
                source,
            })?;
        Ok(())
    }

    async fn promote_host(&self, room_id: String, player_id: Uuid) -> MongoResult<bool> {
        let collection = self.player_collection().await;
        let result = collection
            .update_one(
                doc! {"_id": player_id.to_string(), "room_id": &room_id},
                doc! {"$set": {"is_host": true}},
            )
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "promote_host",
                room_id,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn reset_round(&self, room_id: String) -> MongoResult<()> {
        let collection = self.player_collection().await;
        collection
            .update_many(
                doc! {"room_id": &room_id},
                doc! {"$set": {
                    "has_submitted": false,
                    "asset_a": Bson::Null,
                    "asset_b": Bson::Null,
                }},
            )
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "reset_round",
                room_id,
                source,
            })?;
        Ok(())
    }

    async fn clear_submissions(&self, room_id: String) -> MongoResult<()> {
        let collection = self.player_collection().await;
        collection
            .update_many(
                doc! {"room_id": &room_id},
                doc! {"$set": {"has_submitted": false}},
            )
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "clear_submissions",
                room_id,
                source,
            })?;
        Ok(())
    }

    async fn delete_player(&self, room_id: String, player_id: Uuid) -> MongoResult<bool> {
        let collection = self.player_collection().await;
        let result = collection
            .delete_one(doc! {"_id": player_id.to_string(), "room_id": &room_id})
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "delete",
                room_id,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_players(&self, room_id: String) -> MongoResult<u64> {
        let collection = self.player_collection().await;
        let result = collection
            .delete_many(doc! {"room_id": &room_id})
            .await
            .map_err(|source| MongoDaoError::Player {
                operation: "delete_all",
                room_id,
                source,
            })?;
        Ok(result.deleted_count)
    }
}

impl RoomStore for MongoRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.insert_room(room).await.map_err(Into::into) })
    }

    fn find_room(&self, id: String) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_room(id).await.map_err(Into::into) })
    }

    fn transition_room(
        &self,
        id: String,
        from: RoomPhase,
        to: RoomPhase,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.transition_room(id, from, to).await.map_err(Into::into) })
    }

    fn delete_room(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_room(id).await.map_err(Into::into) })
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_player(player).await.map_err(Into::into) })
    }

    fn find_player(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_player(room_id, player_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_players(
        &self,
        room_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_players(room_id).await.map_err(Into::into) })
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
            store
                .record_investment(room_id, player_id, asset_a, asset_b)
                .await
                .map_err(Into::into)
        })
    }

    fn mark_restart_vote(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .mark_restart_vote(room_id, player_id)
                .await
                .map_err(Into::into)
        })
    }

    fn clear_hosts(&self, room_id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.clear_hosts(room_id).await.map_err(Into::into) })
    }

    fn promote_host(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .promote_host(room_id, player_id)
                .await
                .map_err(Into::into)
        })
    }

    fn reset_round(&self, room_id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reset_round(room_id).await.map_err(Into::into) })
    }

    fn clear_submissions(&self, room_id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.clear_submissions(room_id).await.map_err(Into::into) })
    }

    fn delete_player(
        &self,
        room_id: String,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_player(room_id, player_id)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_players(&self, room_id: String) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.delete_players(room_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
