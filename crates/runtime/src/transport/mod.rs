//! Network front ends for the session server.
mod tcp;

pub use tcp::{MAX_LINE_BYTES, TcpGateway};
