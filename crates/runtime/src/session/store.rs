//! Room registry and participant index.
//!
//! [`SessionStore`] is owned by the session worker and mutated one request at
//! a time, so no room field is ever touched concurrently. Each operation
//! returns the requester's [`Reply`]: a response body plus [`Notice`]s for
//! other connections, delivered in order after the response.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use game_core::CharacterOracle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{ConnectionId, SessionError};
use crate::events::{CloseReason, Event, RoomEvent, SyncEvent};
use crate::protocol::{ClientRequest, ResponseBody, Role, RoomCode, RoomStatus, ServerMessage};

use super::room::{Room, RoomKind, Seat};

/// A message for a connection other than the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub to: ConnectionId,
    pub message: ServerMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub body: ResponseBody,
    pub notices: Vec<Notice>,
}

impl Reply {
    fn body(body: ResponseBody) -> Self {
        Self {
            body,
            notices: Vec::new(),
        }
    }

    fn notify(mut self, to: Option<ConnectionId>, message: ServerMessage) -> Self {
        if let Some(to) = to {
            self.notices.push(Notice { to, message });
        }
        self
    }
}

type SessionResult<T> = Result<T, SessionError>;

pub struct SessionStore {
    rooms: HashMap<RoomCode, Room>,
    participants: HashMap<ConnectionId, RoomCode>,
    oracle: Arc<dyn CharacterOracle>,
    rng: StdRng,
    room_ttl: Duration,
    invite_ttl: Duration,
    events: Vec<Event>,
}

impl SessionStore {
    pub fn new(oracle: Arc<dyn CharacterOracle>, room_ttl: Duration, invite_ttl: Duration) -> Self {
        Self::with_rng(oracle, room_ttl, invite_ttl, StdRng::from_entropy())
    }

    /// Same as [`SessionStore::new`] with a caller-supplied RNG for room codes
    /// and tokens.
    pub fn with_rng(
        oracle: Arc<dyn CharacterOracle>,
        room_ttl: Duration,
        invite_ttl: Duration,
        rng: StdRng,
    ) -> Self {
        Self {
            rooms: HashMap::new(),
            participants: HashMap::new(),
            oracle,
            rng,
            room_ttl,
            invite_ttl,
            events: Vec::new(),
        }
    }

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn room_of(&self, connection: ConnectionId) -> Option<&Room> {
        self.participants
            .get(&connection)
            .and_then(|code| self.rooms.get(code))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Events accumulated since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Dispatches one request from `connection`.
    pub fn handle(
        &mut self,
        connection: ConnectionId,
        request: ClientRequest,
        now: Instant,
    ) -> SessionResult<Reply> {
        match request {
            ClientRequest::ListCharacters => Ok(Reply::body(ResponseBody {
                characters: Some(self.oracle.ids()),
                ..Default::default()
            })),
            ClientRequest::CreateRoom { character_id } => {
                self.create_room(connection, &character_id, RoomKind::Regular, now)
            }
            ClientRequest::CreateInviteRoom { character_id } => {
                self.create_room(connection, &character_id, RoomKind::Invite, now)
            }
            ClientRequest::JoinRoom {
                room_code,
                character_id,
            } => self.join_room(connection, &room_code, &character_id, now),
            ClientRequest::ReclaimSeat { room_code, token } => {
                self.reclaim_seat(connection, &room_code, &token, now)
            }
            ClientRequest::SubmitMove { maneuver } => self.submit_move(connection, maneuver, now),
            ClientRequest::ReportDigest { round, digest } => {
                self.report_digest(connection, round, digest, now)
            }
            ClientRequest::GameOver { winner } => self.report_game_over(connection, winner, now),
            ClientRequest::RequestRematch => self.request_rematch(connection, now),
            ClientRequest::AcceptRematch => self.accept_rematch(connection, now),
            ClientRequest::LeaveRoom => self.leave(connection, now),
        }
    }

    pub fn create_room(
        &mut self,
        connection: ConnectionId,
        character_id: &str,
        kind: RoomKind,
        now: Instant,
    ) -> SessionResult<Reply> {
        self.ensure_unseated(connection)?;
        self.ensure_character(character_id)?;

        let code = self.unused_code();
        let mut room = Room::new(code.clone(), kind, Seat::new(connection, character_id), now);
        if kind == RoomKind::Invite {
            room = room.with_tokens(self.token(), self.token());
        }

        let body = ResponseBody {
            room_code: Some(code.clone()),
            is_host: Some(true),
            host_token: room.host_token.clone(),
            guest_token: room.guest_token.clone(),
            ..Default::default()
        };

        info!(room = %code, %connection, character = character_id, ?kind, "room created");
        self.events.push(Event::Room(RoomEvent::Created {
            room: code.clone(),
            host_character: character_id.to_owned(),
            invite: kind == RoomKind::Invite,
        }));
        self.participants.insert(connection, code.clone());
        self.rooms.insert(code, room);

        Ok(Reply::body(body))
    }

    pub fn join_room(
        &mut self,
        connection: ConnectionId,
        room_code: &str,
        character_id: &str,
        now: Instant,
    ) -> SessionResult<Reply> {
        let code = RoomCode::parse(room_code)
            .ok_or_else(|| SessionError::RoomNotFound(room_code.to_owned()))?;
        if let Some(current) = self.participants.get(&connection) {
            return Err(if *current == code {
                SessionError::OwnRoom
            } else {
                SessionError::AlreadyInRoom(current.clone())
            });
        }
        self.ensure_character(character_id)?;

        let room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| SessionError::RoomNotFound(code.to_string()))?;
        if room.guest.is_some() || room.status != RoomStatus::Waiting {
            return Err(SessionError::RoomFull(code));
        }
        let host = room.host.as_ref().ok_or(SessionError::OpponentMissing)?;
        let host_character = host.character_id.clone();
        let host_connection = host.connection;

        room.guest = Some(Seat::new(connection, character_id));
        room.reset_battle();
        room.status = RoomStatus::Battle;
        room.touch(now);

        let start = ServerMessage::BattleStart {
            room_code: code.clone(),
            host_character: host_character.clone(),
            guest_character: character_id.to_owned(),
        };
        let reply = Reply::body(ResponseBody {
            room_code: Some(code.clone()),
            is_host: Some(false),
            host_character: Some(host_character.clone()),
            guest_character: Some(character_id.to_owned()),
            ..Default::default()
        })
        .notify(host_connection, start.clone())
        .notify(Some(connection), start);

        info!(room = %code, %connection, character = character_id, "guest joined, battle started");
        self.events.push(Event::Room(RoomEvent::BattleStarted {
            room: code.clone(),
            host_character,
            guest_character: character_id.to_owned(),
        }));
        self.participants.insert(connection, code);

        Ok(reply)
    }

    pub fn reclaim_seat(
        &mut self,
        connection: ConnectionId,
        room_code: &str,
        token: &str,
        now: Instant,
    ) -> SessionResult<Reply> {
        self.ensure_unseated(connection)?;
        let code = RoomCode::parse(room_code)
            .ok_or_else(|| SessionError::RoomNotFound(room_code.to_owned()))?;
        let room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| SessionError::RoomNotFound(code.to_string()))?;

        let role = [Role::Host, Role::Guest]
            .into_iter()
            .find(|&role| room.token(role) == Some(token))
            .ok_or(SessionError::InvalidToken)?;
        // A guest token only becomes reclaimable once someone took the seat.
        let seat = room.seat_mut(role).ok_or(SessionError::InvalidToken)?;
        if seat.connection.is_some() {
            return Err(SessionError::SeatOccupied);
        }
        seat.connection = Some(connection);
        let pending_move = seat.pending_move.clone();
        room.touch(now);

        let body = ResponseBody {
            room_code: Some(code.clone()),
            is_host: Some(role == Role::Host),
            host_character: room.host.as_ref().map(|s| s.character_id.clone()),
            guest_character: room.guest.as_ref().map(|s| s.character_id.clone()),
            status: Some(room.status),
            history: Some(room.history.clone()),
            pending_move,
            ..Default::default()
        };
        let reply = Reply::body(body).notify(
            room.connection(role.opponent()),
            ServerMessage::OpponentReconnected,
        );

        info!(room = %code, %connection, %role, "seat reclaimed");
        self.events.push(Event::Room(RoomEvent::SeatReclaimed {
            room: code.clone(),
            role,
        }));
        self.participants.insert(connection, code);

        Ok(reply)
    }

    pub fn submit_move(
        &mut self,
        connection: ConnectionId,
        maneuver: String,
        now: Instant,
    ) -> SessionResult<Reply> {
        let (code, role) = self.seat_of(connection)?;
        let oracle = Arc::clone(&self.oracle);
        let room = self.room_mut(&code)?;

        if room.status != RoomStatus::Battle {
            return Err(SessionError::BattleNotActive(room.status));
        }
        if room.seat(role.opponent()).is_none() {
            return Err(SessionError::OpponentMissing);
        }
        let seat = room.seat_mut(role).ok_or(SessionError::NotInRoom)?;
        let known = oracle
            .character(&seat.character_id)
            .is_some_and(|character| character.maneuver(&maneuver).is_some());
        if !known {
            return Err(SessionError::UnknownManeuver(maneuver));
        }
        if seat.pending_move.is_some() {
            return Err(SessionError::MoveAlreadySubmitted);
        }

        seat.pending_move = Some(maneuver);
        room.touch(now);
        debug!(room = %code, %role, round = room.round, "move submitted");

        let mut reply = Reply::default().notify(
            room.connection(role.opponent()),
            ServerMessage::OpponentReady,
        );

        if let Some(revealed) = room.take_moves() {
            let message = ServerMessage::MovesRevealed {
                round: revealed.round,
                host_move: revealed.host_move,
                guest_move: revealed.guest_move,
            };
            reply = reply
                .notify(room.connection(Role::Host), message.clone())
                .notify(room.connection(Role::Guest), message);

            debug!(room = %code, round = revealed.round, "moves revealed");
            self.events.push(Event::Room(RoomEvent::MovesRevealed {
                room: code,
                round: revealed.round,
            }));
        }

        Ok(reply)
    }

    pub fn report_digest(
        &mut self,
        connection: ConnectionId,
        round: u32,
        digest: String,
        now: Instant,
    ) -> SessionResult<Reply> {
        let (code, role) = self.seat_of(connection)?;
        let room = self.room_mut(&code)?;
        if room.status == RoomStatus::Waiting {
            return Err(SessionError::BattleNotActive(room.status));
        }
        let last = room.last_revealed_round();
        if last != Some(round) {
            return Err(SessionError::DigestRound { round, last });
        }
        room.touch(now);

        let mut reply = Reply::default();
        let Some(pair) = room.record_digest(role, round, digest) else {
            return Ok(reply);
        };
        let (Some(host_digest), Some(guest_digest)) = (pair.host, pair.guest) else {
            return Ok(reply);
        };

        if host_digest != guest_digest {
            warn!(room = %code, round, %host_digest, %guest_digest, "replica digests diverged");
            let message = ServerMessage::SyncMismatch {
                round,
                host_digest: host_digest.clone(),
                guest_digest: guest_digest.clone(),
            };
            reply = reply
                .notify(room.connection(Role::Host), message.clone())
                .notify(room.connection(Role::Guest), message);
            self.events.push(Event::Sync(SyncEvent::Mismatch {
                room: code,
                round,
                host_digest,
                guest_digest,
            }));
        }

        Ok(reply)
    }

    pub fn report_game_over(
        &mut self,
        connection: ConnectionId,
        winner: Role,
        now: Instant,
    ) -> SessionResult<Reply> {
        let (code, role) = self.seat_of(connection)?;
        let room = self.room_mut(&code)?;
        if room.status == RoomStatus::Waiting {
            return Err(SessionError::BattleNotActive(room.status));
        }
        room.touch(now);
        room.reported_winners.insert(role, winner);

        let newly_over = room.status == RoomStatus::Battle;
        room.status = RoomStatus::Gameover;

        let host_says = room.reported_winners.get(&Role::Host).copied();
        let guest_says = room.reported_winners.get(&Role::Guest).copied();

        if newly_over {
            info!(room = %code, %winner, reported_by = %role, "battle over");
            self.events.push(Event::Room(RoomEvent::GameOver {
                room: code.clone(),
                winner,
            }));
        }
        if let (Some(host_says), Some(guest_says)) = (host_says, guest_says) {
            if host_says != guest_says {
                warn!(room = %code, %host_says, %guest_says, "peers disagree on the winner");
                self.events.push(Event::Sync(SyncEvent::WinnerDisagreement {
                    room: code,
                    host_says,
                    guest_says,
                }));
            }
        }

        Ok(Reply::default())
    }

    pub fn request_rematch(
        &mut self,
        connection: ConnectionId,
        now: Instant,
    ) -> SessionResult<Reply> {
        let (code, role) = self.seat_of(connection)?;
        let room = self.room_mut(&code)?;
        if room.status == RoomStatus::Waiting {
            return Err(SessionError::BattleNotActive(room.status));
        }
        let opponent = room
            .connection(role.opponent())
            .ok_or(SessionError::OpponentMissing)?;

        room.rematch_requested_by = Some(role);
        room.touch(now);
        debug!(room = %code, %role, "rematch requested");

        Ok(Reply::default().notify(Some(opponent), ServerMessage::RematchRequested))
    }

    pub fn accept_rematch(&mut self, connection: ConnectionId, now: Instant) -> SessionResult<Reply> {
        let (code, role) = self.seat_of(connection)?;
        let room = self.room_mut(&code)?;
        if room.rematch_requested_by != Some(role.opponent()) {
            return Err(SessionError::NoRematchRequested);
        }

        room.reset_battle();
        room.status = RoomStatus::Battle;
        room.touch(now);

        let reply = Reply::default()
            .notify(room.connection(Role::Host), ServerMessage::RematchStart)
            .notify(room.connection(Role::Guest), ServerMessage::RematchStart);

        info!(room = %code, "rematch started");
        self.events
            .push(Event::Room(RoomEvent::RematchStarted { room: code }));

        Ok(reply)
    }

    /// Explicit `leave-room`.
    pub fn leave(&mut self, connection: ConnectionId, now: Instant) -> SessionResult<Reply> {
        if !self.participants.contains_key(&connection) {
            return Err(SessionError::NotInRoom);
        }
        Ok(Reply {
            body: ResponseBody::default(),
            notices: self.detach(connection, now),
        })
    }

    /// Transport-level disconnect. Never fails.
    pub fn disconnect(&mut self, connection: ConnectionId, now: Instant) -> Vec<Notice> {
        self.detach(connection, now)
    }

    /// Removes rooms idle past their TTL and notifies anyone still attached.
    pub fn sweep(&mut self, now: Instant) -> Vec<Notice> {
        let expired: Vec<RoomCode> = self
            .rooms
            .values()
            .filter(|room| room.is_expired(now, self.room_ttl, self.invite_ttl))
            .map(|room| room.code.clone())
            .collect();

        let mut notices = Vec::new();
        for code in expired {
            notices.extend(self.close(&code, CloseReason::Expired));
        }
        notices
    }

    fn detach(&mut self, connection: ConnectionId, now: Instant) -> Vec<Notice> {
        let Some(code) = self.participants.remove(&connection) else {
            return Vec::new();
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return Vec::new();
        };
        let Some(role) = room.role_of(connection) else {
            return Vec::new();
        };
        room.touch(now);

        let mut notices = Vec::new();
        let mut promoted_guest = false;

        match room.kind {
            RoomKind::Invite => {
                if let Some(seat) = room.seat_mut(role) {
                    seat.connection = None;
                }
                if let Some(to) = room.connection(role.opponent()) {
                    notices.push(Notice {
                        to,
                        message: ServerMessage::OpponentDisconnected {
                            promoted_to_host: false,
                        },
                    });
                }
            }
            RoomKind::Regular => {
                match role {
                    Role::Host => {
                        room.host = room.guest.take();
                        promoted_guest = room.host.is_some();
                    }
                    Role::Guest => room.guest = None,
                }
                room.reset_battle();
                room.status = RoomStatus::Waiting;

                if let Some(to) = room.connection(Role::Host) {
                    notices.push(Notice {
                        to,
                        message: ServerMessage::OpponentDisconnected {
                            promoted_to_host: promoted_guest,
                        },
                    });
                }
            }
        }

        info!(room = %code, %connection, %role, promoted_guest, "participant left");
        self.events.push(Event::Room(RoomEvent::SeatLeft {
            room: code.clone(),
            role,
            promoted_guest,
        }));

        let abandoned = room.kind == RoomKind::Regular && room.host.is_none();
        if abandoned {
            notices.extend(self.close(&code, CloseReason::Abandoned));
        }
        notices
    }

    fn close(&mut self, code: &RoomCode, reason: CloseReason) -> Vec<Notice> {
        let Some(room) = self.rooms.remove(code) else {
            return Vec::new();
        };

        let notices = room
            .connections()
            .map(|to| Notice {
                to,
                message: ServerMessage::RoomClosed {
                    reason: reason.to_string(),
                },
            })
            .collect::<Vec<_>>();
        for notice in &notices {
            self.participants.remove(&notice.to);
        }

        info!(room = %code, %reason, "room closed");
        self.events.push(Event::Room(RoomEvent::Closed {
            room: code.clone(),
            reason,
        }));
        notices
    }

    fn seat_of(&self, connection: ConnectionId) -> SessionResult<(RoomCode, Role)> {
        let code = self
            .participants
            .get(&connection)
            .ok_or(SessionError::NotInRoom)?;
        let role = self
            .rooms
            .get(code)
            .and_then(|room| room.role_of(connection))
            .ok_or(SessionError::NotInRoom)?;
        Ok((code.clone(), role))
    }

    fn room_mut(&mut self, code: &RoomCode) -> SessionResult<&mut Room> {
        self.rooms
            .get_mut(code)
            .ok_or_else(|| SessionError::RoomNotFound(code.to_string()))
    }

    fn ensure_unseated(&self, connection: ConnectionId) -> SessionResult<()> {
        match self.participants.get(&connection) {
            Some(code) => Err(SessionError::AlreadyInRoom(code.clone())),
            None => Ok(()),
        }
    }

    fn ensure_character(&self, character_id: &str) -> SessionResult<()> {
        match self.oracle.character(character_id) {
            Some(_) => Ok(()),
            None => Err(SessionError::UnknownCharacter(character_id.to_owned())),
        }
    }

    fn unused_code(&mut self) -> RoomCode {
        loop {
            let code = RoomCode::generate(&mut self.rng);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    fn token(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes[..]);
        hex::encode(bytes)
    }
}
