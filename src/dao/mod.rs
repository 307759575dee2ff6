//! Persistence layer: entities, backend-agnostic errors, and the room store
//! abstraction with its concrete backends.

pub mod models;
pub mod room_store;
pub mod storage;
