use thiserror::Error;

use crate::dao::storage::StorageError;

/// Result alias for MongoDB backend operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB room store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// The driver client could not be constructed.
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// The initial ping never succeeded.
    #[error("MongoDB did not answer the initial ping after {attempts} attempts")]
    InitialPing {
        /// Number of attempts performed.
        attempts: u32,
        /// Driver error from the last attempt.
        #[source]
        source: mongodb::error::Error,
    },
    /// Index creation failed during startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection name.
        collection: &'static str,
        /// Index description.
        index: &'static str,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// The health ping failed.
    #[error("MongoDB health ping failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A read or write against the `rooms` collection failed.
    #[error("room operation `{operation}` failed for `{id}`")]
    Room {
        /// Short operation label (insert/load/update/delete).
        operation: &'static str,
        /// Room code involved.
        id: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A read or write against the `players` collection failed.
    #[error("player operation `{operation}` failed in room `{room_id}`")]
    Player {
        /// Short operation label.
        operation: &'static str,
        /// Room the operation targeted.
        room_id: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A stored player id was not a valid UUID.
    #[error("stored player id `{value}` is not a valid UUID")]
    InvalidPlayerId {
        /// Raw value found in the document.
        value: String,
        /// Parse error.
        #[source]
        source: uuid::Error,
    },
}

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
