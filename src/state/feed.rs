use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Per-room broadcast hubs backing the change feed.
///
/// Writing to storage does not notify anyone by itself; the services publish
/// here after every successful mutation so connected clients know to re-read
/// the room. No ordering between two rapid notifications is promised.
pub struct RoomFeed {
    channels: DashMap<String, broadcast::Sender<ServerEvent>>,
    capacity: usize,
}

impl RoomFeed {
    /// Build a feed whose per-room channels hold `capacity` pending events.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Register a subscriber for one room, creating its channel on demand.
    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<ServerEvent> {
        self.channels
            .entry(room_id.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send an event to every subscriber of the room, ignoring delivery
    /// errors. Rooms nobody watches simply drop the event.
    pub fn publish(&self, room_id: &str, event: ServerEvent) {
        if let Some(sender) = self.channels.get(room_id) {
            let _ = sender.send(event);
        }
    }

    /// Drop the channel of a room once its last subscriber disconnected.
    pub fn prune(&self, room_id: &str) {
        self.channels
            .remove_if(room_id, |_, sender| sender.receiver_count() == 0);
    }
}
