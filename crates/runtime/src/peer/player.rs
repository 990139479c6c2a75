//! Automated peer that plays one match over a [`PeerClient`].

use std::sync::Arc;

use game_core::{CharacterOracle, GameConfig, Side};
use tracing::{info, warn};

use super::{BattleSession, PeerClient};
use crate::api::{MoveProvider, Result, RuntimeError};
use crate::protocol::{ClientRequest, Role, RoomCode, ServerMessage};

/// How a finished (or abandoned) match ended, from one peer's view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSummary {
    pub room_code: RoomCode,
    pub role: Role,
    /// Rounds resolved locally.
    pub rounds: u32,
    pub winner: Option<Role>,
    pub my_body_points: i32,
    pub opponent_body_points: i32,
    /// Digest of the final replica state.
    pub digest: String,
    pub sync_mismatches: u32,
}

pub struct AutoPlayer<P> {
    client: PeerClient,
    oracle: Arc<dyn CharacterOracle>,
    provider: P,
    character_id: String,
    max_rounds: u32,
    report_digests: bool,
    seat: Option<(RoomCode, Role)>,
}

impl<P: MoveProvider> AutoPlayer<P> {
    pub fn new(
        client: PeerClient,
        oracle: Arc<dyn CharacterOracle>,
        provider: P,
        character_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            oracle,
            provider,
            character_id: character_id.into(),
            max_rounds: GameConfig::DEFAULT_MAX_ROUNDS,
            report_digests: true,
            seat: None,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_digests(mut self, report_digests: bool) -> Self {
        self.report_digests = report_digests;
        self
    }

    /// Creates a regular room and returns its code.
    pub async fn host(&mut self) -> Result<RoomCode> {
        let body = self
            .client
            .request(ClientRequest::CreateRoom {
                character_id: self.character_id.clone(),
            })
            .await?;
        let code = body.room_code.ok_or(RuntimeError::UnexpectedMessage {
            expected: "room code",
            received: "create-room response without roomCode".into(),
        })?;
        info!(room = %code, character = %self.character_id, "hosting");
        self.seat = Some((code.clone(), Role::Host));
        Ok(code)
    }

    pub async fn join(&mut self, code: &RoomCode) -> Result<()> {
        self.client
            .request(ClientRequest::JoinRoom {
                room_code: code.to_string(),
                character_id: self.character_id.clone(),
            })
            .await?;
        info!(room = %code, character = %self.character_id, "joined");
        self.seat = Some((code.clone(), Role::Guest));
        Ok(())
    }

    /// Waits for the battle to start, then plays until it ends locally or
    /// the round cap is hit.
    pub async fn play_match(&mut self) -> Result<MatchSummary> {
        let (room_code, role) = self.seat.clone().ok_or(RuntimeError::UnexpectedMessage {
            expected: "a room",
            received: "play_match before host or join".into(),
        })?;
        let mut session = self.await_start(room_code, role).await?;
        let mut sync_mismatches = 0;

        while !session.is_over() && session.battle().round() <= self.max_rounds {
            let choice = self
                .provider
                .choose_maneuver(session.battle(), Side::Player1)
                .await?;
            let submit = session.select(&choice)?;
            self.client.request(submit).await?;

            loop {
                match self.client.next_event().await? {
                    ServerMessage::MovesRevealed {
                        round,
                        host_move,
                        guest_move,
                    } => {
                        session.apply_reveal(round, &host_move, &guest_move)?;
                        break;
                    }
                    ServerMessage::OpponentReady => {}
                    ServerMessage::SyncMismatch { round, .. } => {
                        warn!(room = %session.room_code(), round, "server reports diverged replicas");
                        sync_mismatches += 1;
                    }
                    other => {
                        return Err(RuntimeError::UnexpectedMessage {
                            expected: "moves-revealed",
                            received: format!("{other:?}"),
                        });
                    }
                }
            }

            if self.report_digests {
                self.client.request(session.digest_request()).await?;
            }
        }

        if let Some(request) = session.game_over_request() {
            self.client.request(request).await?;
        }

        let summary = MatchSummary {
            room_code: session.room_code().clone(),
            role: session.role(),
            rounds: session.battle().round() - 1,
            winner: session.winner_role(),
            my_body_points: session.battle().player1().state.body_points,
            opponent_body_points: session.battle().player2().state.body_points,
            digest: session.digest(),
            sync_mismatches,
        };
        info!(
            room = %summary.room_code,
            role = %summary.role,
            rounds = summary.rounds,
            winner = ?summary.winner,
            "match finished"
        );
        Ok(summary)
    }

    pub async fn leave(&mut self) -> Result<()> {
        self.client.request(ClientRequest::LeaveRoom).await?;
        self.seat = None;
        Ok(())
    }

    async fn await_start(&mut self, room_code: RoomCode, role: Role) -> Result<BattleSession> {
        loop {
            match self.client.next_event().await? {
                ServerMessage::BattleStart {
                    host_character,
                    guest_character,
                    ..
                } => {
                    let (mine, theirs) = match role {
                        Role::Host => (host_character, guest_character),
                        Role::Guest => (guest_character, host_character),
                    };
                    let me = self.character(&mine)?;
                    let opponent = self.character(&theirs)?;
                    return Ok(BattleSession::new(room_code, role, me, opponent));
                }
                ServerMessage::OpponentDisconnected { .. } => {}
                other => {
                    return Err(RuntimeError::UnexpectedMessage {
                        expected: "battle-start",
                        received: format!("{other:?}"),
                    });
                }
            }
        }
    }

    fn character(&self, id: &str) -> Result<Arc<game_core::Character>> {
        self.oracle
            .character(id)
            .ok_or_else(|| RuntimeError::UnknownCharacter(id.to_owned()))
    }
}
