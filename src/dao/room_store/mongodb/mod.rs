//! MongoDB-backed [`RoomStore`](crate::dao::room_store::RoomStore)
//! implementation. Conditional writes are expressed as update filters that
//! carry the guard, so the database enforces the compare-and-swap semantics
//! the services rely on.

mod config;
mod connection;
mod error;
mod models;
mod store;

pub use config::MongoConfig;
pub use error::{MongoDaoError, MongoResult};
pub use store::MongoRoomStore;
