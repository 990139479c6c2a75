//! Topic-based event bus for runtime events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. The session worker publishes room lifecycle and sync
//! events here; peers and the binary use it for logging and summaries.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CloseReason, RoomEvent, SyncEvent};
