//! A two-seat room: who sits where, pending moves, and rematch flags.
//!
//! Rooms know nothing about battles. Each peer resolves exchanges locally;
//! the room only holds moves until both are in, then hands them out.

use std::collections::BTreeMap;

use tokio::time::Instant;

use crate::api::ConnectionId;
use crate::protocol::{RevealedMoves, Role, RoomCode, RoomStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomKind {
    Regular,
    /// Seats are reclaimable by token and the room outlives disconnects.
    Invite,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seat {
    /// `None` while the participant is disconnected.
    pub connection: Option<ConnectionId>,
    pub character_id: String,
    pub pending_move: Option<String>,
}

impl Seat {
    pub fn new(connection: ConnectionId, character_id: impl Into<String>) -> Self {
        Self {
            connection: Some(connection),
            character_id: character_id.into(),
            pending_move: None,
        }
    }
}

/// Both digests reported for one round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DigestPair {
    pub host: Option<String>,
    pub guest: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Room {
    pub code: RoomCode,
    pub kind: RoomKind,
    pub status: RoomStatus,
    pub host: Option<Seat>,
    pub guest: Option<Seat>,
    /// Reclaim tokens, invite rooms only.
    pub host_token: Option<String>,
    pub guest_token: Option<String>,
    /// Next round to be revealed.
    pub round: u32,
    pub history: Vec<RevealedMoves>,
    pub digests: BTreeMap<u32, DigestPair>,
    pub rematch_requested_by: Option<Role>,
    pub reported_winners: BTreeMap<Role, Role>,
    pub created_at: Instant,
    pub last_activity: Instant,
}

impl Room {
    pub fn new(code: RoomCode, kind: RoomKind, host: Seat, now: Instant) -> Self {
        Self {
            code,
            kind,
            status: RoomStatus::Waiting,
            host: Some(host),
            guest: None,
            host_token: None,
            guest_token: None,
            round: 1,
            history: Vec::new(),
            digests: BTreeMap::new(),
            rematch_requested_by: None,
            reported_winners: BTreeMap::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn with_tokens(mut self, host_token: String, guest_token: String) -> Self {
        self.host_token = Some(host_token);
        self.guest_token = Some(guest_token);
        self
    }

    pub fn seat(&self, role: Role) -> Option<&Seat> {
        match role {
            Role::Host => self.host.as_ref(),
            Role::Guest => self.guest.as_ref(),
        }
    }

    pub fn seat_mut(&mut self, role: Role) -> Option<&mut Seat> {
        match role {
            Role::Host => self.host.as_mut(),
            Role::Guest => self.guest.as_mut(),
        }
    }

    pub fn token(&self, role: Role) -> Option<&str> {
        match role {
            Role::Host => self.host_token.as_deref(),
            Role::Guest => self.guest_token.as_deref(),
        }
    }

    /// Role held by `connection`, if it sits in this room.
    pub fn role_of(&self, connection: ConnectionId) -> Option<Role> {
        [Role::Host, Role::Guest]
            .into_iter()
            .find(|&role| self.connection(role) == Some(connection))
    }

    pub fn connection(&self, role: Role) -> Option<ConnectionId> {
        self.seat(role).and_then(|seat| seat.connection)
    }

    /// Connections currently attached, host first.
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        [Role::Host, Role::Guest]
            .into_iter()
            .filter_map(|role| self.connection(role))
    }

    pub fn is_empty(&self) -> bool {
        self.connections().next().is_none()
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Both pending moves, if both seats have submitted.
    pub fn take_moves(&mut self) -> Option<RevealedMoves> {
        let ready = self.host.as_ref()?.pending_move.is_some()
            && self.guest.as_ref()?.pending_move.is_some();
        if !ready {
            return None;
        }

        let host_move = self.host.as_mut()?.pending_move.take()?;
        let guest_move = self.guest.as_mut()?.pending_move.take()?;
        let revealed = RevealedMoves {
            round: self.round,
            host_move,
            guest_move,
        };
        self.round += 1;
        // Half-reported digests of earlier rounds can no longer complete.
        self.digests.retain(|&round, _| round >= revealed.round);
        self.history.push(revealed.clone());
        Some(revealed)
    }

    /// Clears everything tied to the current battle.
    pub fn reset_battle(&mut self) {
        for seat in [self.host.as_mut(), self.guest.as_mut()].into_iter().flatten() {
            seat.pending_move = None;
        }
        self.round = 1;
        self.history.clear();
        self.digests.clear();
        self.rematch_requested_by = None;
        self.reported_winners.clear();
    }

    /// Most recent round whose moves were revealed.
    pub fn last_revealed_round(&self) -> Option<u32> {
        self.round.checked_sub(1).filter(|&round| round > 0)
    }

    /// Records a digest report; returns the pair once both sides are in.
    pub fn record_digest(&mut self, role: Role, round: u32, digest: String) -> Option<DigestPair> {
        let pair = self.digests.entry(round).or_default();
        match role {
            Role::Host => pair.host = Some(digest),
            Role::Guest => pair.guest = Some(digest),
        }
        if pair.host.is_some() && pair.guest.is_some() {
            self.digests.remove(&round)
        } else {
            None
        }
    }

    /// Idle TTL applicable to this room.
    pub fn is_expired(&self, now: Instant, room_ttl: std::time::Duration, invite_ttl: std::time::Duration) -> bool {
        let ttl = match self.kind {
            RoomKind::Regular => room_ttl,
            RoomKind::Invite => invite_ttl,
        };
        now.saturating_duration_since(self.last_activity) > ttl
    }
}
