//! Unified error types surfaced by the runtime API.
//!
//! [`SessionError`] covers requests the session server refuses; each maps to
//! a wire error string and code returned to the requester only.
//! [`RuntimeError`] wraps failures from worker coordination, transport, and
//! the peer-side battle replica.
use thiserror::Error;
use tokio::sync::oneshot;

use game_core::BattleError;

use crate::protocol::{RoomCode, RoomStatus};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("room {0} not found")]
    RoomNotFound(String),

    #[error("room {0} is full")]
    RoomFull(RoomCode),

    #[error("cannot join your own room")]
    OwnRoom,

    #[error("already in room {0}")]
    AlreadyInRoom(RoomCode),

    #[error("not in a room")]
    NotInRoom,

    #[error("invalid token")]
    InvalidToken,

    #[error("seat is already connected")]
    SeatOccupied,

    #[error("unknown character '{0}'")]
    UnknownCharacter(String),

    #[error("unknown maneuver '{0}'")]
    UnknownManeuver(String),

    #[error("room is {0}, not in battle")]
    BattleNotActive(RoomStatus),

    #[error("move already submitted for this round")]
    MoveAlreadySubmitted,

    #[error("opponent is not present")]
    OpponentMissing,

    #[error("no rematch has been requested by the opponent")]
    NoRematchRequested,

    #[error("digest for round {round} does not match the last revealed round {last:?}")]
    DigestRound { round: u32, last: Option<u32> },
}

impl SessionError {
    /// Static identifier sent alongside the message, useful for clients and tests.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "ROOM_NOT_FOUND",
            Self::RoomFull(_) => "ROOM_FULL",
            Self::OwnRoom => "OWN_ROOM",
            Self::AlreadyInRoom(_) => "ALREADY_IN_ROOM",
            Self::NotInRoom => "NOT_IN_ROOM",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::SeatOccupied => "SEAT_OCCUPIED",
            Self::UnknownCharacter(_) => "UNKNOWN_CHARACTER",
            Self::UnknownManeuver(_) => "UNKNOWN_MANEUVER",
            Self::BattleNotActive(_) => "BATTLE_NOT_ACTIVE",
            Self::MoveAlreadySubmitted => "MOVE_ALREADY_SUBMITTED",
            Self::OpponentMissing => "OPPONENT_MISSING",
            Self::NoRematchRequested => "NO_REMATCH_REQUESTED",
            Self::DigestRound { .. } => "INVALID_ROUND",
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("failed to load character roster: {0}")]
    Roster(String),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed message")]
    Json(#[from] serde_json::Error),

    #[error("server refused {request}: {message} ({code})")]
    Refused {
        request: &'static str,
        code: String,
        message: String,
    },

    #[error("unexpected message while waiting for {expected}: {received}")]
    UnexpectedMessage {
        expected: &'static str,
        received: String,
    },

    #[error("unknown character '{0}'")]
    UnknownCharacter(String),

    #[error("{character} has no maneuver '{maneuver}'")]
    UnknownManeuver { character: String, maneuver: String },

    #[error("revealed moves are for round {received}, local battle is at round {expected}")]
    RoundMismatch { expected: u32, received: u32 },

    #[error("no legal maneuver available in round {round}")]
    NoLegalManeuver { round: u32 },

    #[error(transparent)]
    Battle(#[from] BattleError),
}
