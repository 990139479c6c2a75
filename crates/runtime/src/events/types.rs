//! Event payloads published by the session worker and peers.

use serde::{Deserialize, Serialize};

use crate::protocol::{Role, RoomCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CloseReason {
    /// Last participant left a regular room.
    Abandoned,
    /// Idle longer than the room's TTL.
    Expired,
}

/// Room lifecycle changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomEvent {
    Created {
        room: RoomCode,
        host_character: String,
        invite: bool,
    },
    BattleStarted {
        room: RoomCode,
        host_character: String,
        guest_character: String,
    },
    MovesRevealed {
        room: RoomCode,
        round: u32,
    },
    GameOver {
        room: RoomCode,
        winner: Role,
    },
    RematchStarted {
        room: RoomCode,
    },
    SeatLeft {
        room: RoomCode,
        role: Role,
        promoted_guest: bool,
    },
    SeatReclaimed {
        room: RoomCode,
        role: Role,
    },
    Closed {
        room: RoomCode,
        reason: CloseReason,
    },
}

/// Replica consistency reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncEvent {
    /// Both peers reported different digests for the same round.
    Mismatch {
        room: RoomCode,
        round: u32,
        host_digest: String,
        guest_digest: String,
    },
    /// Both peers reported a finished battle but named different winners.
    WinnerDisagreement {
        room: RoomCode,
        host_says: Role,
        guest_says: Role,
    },
}
