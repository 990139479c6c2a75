//! Peer side of a session: the NDJSON client, the local battle replica, and
//! an automated player built from both.
mod battle_session;
mod client;
mod player;

pub use battle_session::BattleSession;
pub use client::PeerClient;
pub use player::{AutoPlayer, MatchSummary};
