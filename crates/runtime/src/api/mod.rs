//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on the session worker, transport, or peers.

pub mod errors;
pub mod handle;
pub mod providers;

pub use errors::{Result, RuntimeError, SessionError};
pub use handle::{Connection, ConnectionId, ConnectionSender, ServerHandle, ServerStats};
pub use providers::{FirstLegalMoveProvider, MoveProvider, RandomMoveProvider};
