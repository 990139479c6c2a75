//! Room state owned by the session worker.
mod room;
mod store;

pub use room::{DigestPair, Room, RoomKind, Seat};
pub use store::{Notice, Reply, SessionStore};
