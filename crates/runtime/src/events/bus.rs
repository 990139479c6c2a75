//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{RoomEvent, SyncEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Room lifecycle (create, join, reveal, rematch, leave, close)
    Room,
    /// Replica consistency (digest mismatches, winner disagreements)
    Sync,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Room(RoomEvent),
    Sync(SyncEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Room(_) => Topic::Room,
            Event::Sync(_) => Topic::Sync,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Cloning shares the underlying channels.
#[derive(Clone)]
pub struct EventBus {
    room: broadcast::Sender<Event>,
    sync: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            room: broadcast::channel(capacity).0,
            sync: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Room => &self.room,
            Topic::Sync => &self.sync,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RoomCode;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut rooms = bus.subscribe(Topic::Room);
        let mut sync = bus.subscribe(Topic::Sync);

        let room = RoomCode::parse("ABC123").unwrap();
        bus.publish(Event::Room(RoomEvent::MovesRevealed {
            room: room.clone(),
            round: 2,
        }));

        assert!(matches!(
            rooms.recv().await.unwrap(),
            Event::Room(RoomEvent::MovesRevealed { round: 2, .. })
        ));
        assert!(sync.try_recv().is_err());
    }
}
