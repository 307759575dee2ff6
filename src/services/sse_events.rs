//! Helpers publishing change-feed notifications after successful mutations.

use tracing::debug;

use crate::{
    dto::sse::{RoomChangedEvent, RoomClosedEvent, ServerEvent},
    state::SharedState,
};

/// Tell every subscriber of the room to re-read its state.
pub fn notify_room_changed(state: &SharedState, room_id: &str, reason: &str) {
    let payload = RoomChangedEvent {
        room_id: room_id.to_owned(),
        reason: reason.to_owned(),
    };
    match ServerEvent::json("room_changed".to_string(), &payload) {
        Ok(event) => state.feed().publish(room_id, event),
        Err(err) => debug!(room_id, error = %err, "failed to serialize room_changed event"),
    }
}

/// Tell every subscriber of the room that it no longer exists.
pub fn notify_room_closed(state: &SharedState, room_id: &str) {
    let payload = RoomClosedEvent {
        room_id: room_id.to_owned(),
    };
    match ServerEvent::json("room_closed".to_string(), &payload) {
        Ok(event) => state.feed().publish(room_id, event),
        Err(err) => debug!(room_id, error = %err, "failed to serialize room_closed event"),
    }
}
