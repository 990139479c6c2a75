//! Worker tasks that back the session server.
//!
//! The session worker is the only owner of room state; everything else talks
//! to it through commands.

mod session;

pub use session::{Command, SessionWorker};
