use serde::Serialize;
use utoipa::ToSchema;

/// Dispatched payload carried across the per-room SSE channels.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized event payload.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already-rendered data string.
    pub fn new<E>(event: E, data: String) -> Self
    where
        E: Into<Option<String>>,
    {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Broadcast whenever a room or one of its players changed; clients are
/// expected to re-read the full room state rather than trust the payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomChangedEvent {
    /// Room the change belongs to.
    pub room_id: String,
    /// Short machine-readable label of what happened.
    pub reason: String,
}

/// Broadcast when a room has been deleted; subscribers should drop their
/// session.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomClosedEvent {
    /// Room that no longer exists.
    pub room_id: String,
}
