//! Session server and peer runtime for two-player combat-book battles.
//!
//! The server never resolves battles. It pairs two participants in a room,
//! holds each round's moves until both are in, and reveals them together.
//! Each peer keeps its own [`peer::BattleSession`] replica and resolves the
//! revealed moves locally.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the server and its builder
//! - [`api`] exposes the handle, connections, errors, and move providers
//! - [`protocol`] defines the line-delimited JSON wire messages
//! - [`session`] holds rooms and the rules for joining, revealing, and leaving
//! - [`events`] provides a topic-based event bus for monitoring
//! - [`transport`] serves connections over TCP
//! - [`peer`] is the client side: wire client, replica, and auto player
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod config;
pub mod events;
pub mod peer;
pub mod protocol;
pub mod runtime;
pub mod session;
pub mod transport;

mod workers;

pub use api::{
    Connection, ConnectionId, ConnectionSender, FirstLegalMoveProvider, MoveProvider,
    RandomMoveProvider, Result, RuntimeError, ServerHandle, ServerStats, SessionError,
};
pub use config::RuntimeConfig;
pub use events::{CloseReason, Event, EventBus, RoomEvent, SyncEvent, Topic};
pub use peer::{AutoPlayer, BattleSession, MatchSummary, PeerClient};
pub use protocol::{
    ClientRequest, RequestEnvelope, ResponseBody, RevealedMoves, Role, RoomCode, RoomStatus,
    ServerMessage,
};
pub use runtime::{Server, ServerBuilder, load_roster};
pub use session::{RoomKind, SessionStore};
pub use transport::{MAX_LINE_BYTES, TcpGateway};
