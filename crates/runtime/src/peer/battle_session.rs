//! Local battle replica kept by each peer.
//!
//! Every peer resolves each round itself, framed with its own character as
//! player 1. The session server relays the two moves as host/guest; the
//! replica maps them to me/opponent by role before resolving.

use std::sync::Arc;

use game_core::{Battle, BattleExchange, Character, GameError, Maneuver, Side, state_digest};
use tracing::{debug, warn};

use crate::api::{Result, RuntimeError};
use crate::protocol::{ClientRequest, RevealedMoves, Role, RoomCode};

pub struct BattleSession {
    room_code: RoomCode,
    role: Role,
    battle: Battle,
    /// Own maneuver submitted for the current round.
    pending: Option<String>,
}

impl BattleSession {
    pub fn new(room_code: RoomCode, role: Role, me: Arc<Character>, opponent: Arc<Character>) -> Self {
        let battle = Battle::new(room_code.as_str(), me, opponent);
        Self {
            room_code,
            role,
            battle,
            pending: None,
        }
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Replica framed with the local character as player 1.
    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_over(&self) -> bool {
        self.battle.is_over()
    }

    pub fn legal_maneuvers(&self) -> Vec<&Maneuver> {
        self.battle.legal_maneuvers(Side::Player1)
    }

    /// Checks `maneuver_id` against the local legal set and returns the
    /// request that submits it.
    pub fn select(&mut self, maneuver_id: &str) -> Result<ClientRequest> {
        let maneuver = self.battle.select(Side::Player1, maneuver_id)?;
        self.pending = Some(maneuver.id.clone());
        Ok(ClientRequest::SubmitMove {
            maneuver: maneuver.id.clone(),
        })
    }

    /// Resolves one revealed round and commits it to the replica.
    pub fn apply_reveal(
        &mut self,
        round: u32,
        host_move: &str,
        guest_move: &str,
    ) -> Result<&BattleExchange> {
        let expected = self.battle.round();
        if round != expected {
            return Err(RuntimeError::RoundMismatch {
                expected,
                received: round,
            });
        }

        let (mine, theirs) = match self.role {
            Role::Host => (host_move, guest_move),
            Role::Guest => (guest_move, host_move),
        };
        let mine = self.maneuver(Side::Player1, mine)?;
        let theirs = self.maneuver(Side::Player2, theirs)?;
        if let Err(err) = self.battle.select(Side::Player2, &theirs.id) {
            // The server only checks the catalog, so resolve anyway.
            warn!(
                room = %self.room_code,
                round,
                code = err.error_code(),
                severity = err.severity().as_str(),
                "opponent move failed local legality: {err}"
            );
        }

        let timestamp = chrono::Utc::now().timestamp_millis();
        let room = &self.room_code;
        let exchange = self.battle.play_round(&mine, &theirs, Some(timestamp))?;
        self.pending = None;

        for defect in exchange.defects() {
            warn!(
                room = %room,
                round,
                code = defect.error_code(),
                severity = defect.severity().as_str(),
                "book defect: {defect}"
            );
        }
        debug!(
            room = %room,
            round,
            me = exchange.player1.state.body_points,
            opponent = exchange.player2.state.body_points,
            extended = exchange.player1.state.is_extended_range,
            "round resolved"
        );
        Ok(exchange)
    }

    /// Canonical digest of the last resolved round, host state first, so
    /// both peers compute the same value when their replicas agree.
    pub fn digest(&self) -> String {
        let me = &self.battle.player1().state;
        let opponent = &self.battle.player2().state;
        let round = self.battle.round().saturating_sub(1);
        match self.role {
            Role::Host => state_digest(round, me, opponent),
            Role::Guest => state_digest(round, opponent, me),
        }
    }

    pub fn digest_request(&self) -> ClientRequest {
        ClientRequest::ReportDigest {
            round: self.battle.round().saturating_sub(1),
            digest: self.digest(),
        }
    }

    /// Winner as a room role, once the local battle is over.
    pub fn winner_role(&self) -> Option<Role> {
        self.battle.winner().map(|side| match side {
            Side::Player1 => self.role,
            Side::Player2 => self.role.opponent(),
        })
    }

    pub fn game_over_request(&self) -> Option<ClientRequest> {
        self.winner_role()
            .map(|winner| ClientRequest::GameOver { winner })
    }

    /// Fresh battle, same characters and seats.
    pub fn rematch(&mut self) {
        self.battle.reset();
        self.pending = None;
    }

    /// Rebuilds the replica from the revealed history returned on seat
    /// reclamation.
    pub fn replay(&mut self, history: &[RevealedMoves]) -> Result<()> {
        self.rematch();
        for moves in history {
            self.apply_reveal(moves.round, &moves.host_move, &moves.guest_move)?;
        }
        Ok(())
    }

    /// After a promotion the remaining peer holds the host seat.
    pub fn promote_to_host(&mut self) {
        self.role = Role::Host;
    }

    fn maneuver(&self, side: Side, id: &str) -> Result<Maneuver> {
        let character = &self.battle.combatant(side).character;
        character
            .maneuver(id)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownManeuver {
                character: character.id.clone(),
                maneuver: id.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use game_content::CharacterRoster;
    use game_core::CharacterOracle;

    use super::*;

    fn pair() -> (BattleSession, BattleSession) {
        let roster = CharacterRoster::bundled().unwrap();
        let knight = roster.character("knight").unwrap();
        let goblin = roster.character("goblin").unwrap();
        let code = RoomCode::parse("ABC123").unwrap();
        (
            BattleSession::new(code.clone(), Role::Host, Arc::clone(&knight), Arc::clone(&goblin)),
            BattleSession::new(code, Role::Guest, goblin, knight),
        )
    }

    #[test]
    fn replicas_agree_after_each_reveal() {
        let (mut host, mut guest) = pair();
        assert_eq!(host.digest(), guest.digest());

        for round in 1..=6 {
            if host.is_over() {
                break;
            }
            let host_move = host.legal_maneuvers()[0].id.clone();
            let guest_move = guest.legal_maneuvers().last().unwrap().id.clone();
            host.select(&host_move).unwrap();
            guest.select(&guest_move).unwrap();

            host.apply_reveal(round, &host_move, &guest_move).unwrap();
            guest.apply_reveal(round, &host_move, &guest_move).unwrap();

            assert!(host.pending().is_none());
            assert_eq!(host.battle().player1().state, guest.battle().player2().state);
            assert_eq!(host.battle().player2().state, guest.battle().player1().state);
            assert_eq!(host.digest_request(), guest.digest_request());
        }
    }

    #[test]
    fn out_of_order_reveal_is_rejected() {
        let (mut host, _) = pair();
        let err = host.apply_reveal(3, "charge", "charge").unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::RoundMismatch {
                expected: 1,
                received: 3
            }
        ));
    }

    #[test]
    fn unknown_or_illegal_selection_fails_locally() {
        let (mut host, _) = pair();
        assert!(host.select("teleport").is_err());
        // Normal-range maneuvers are not legal at the opening extended range.
        assert!(host.select("smash").is_err());
        assert!(host.pending().is_none());
    }

    #[test]
    fn replay_reproduces_live_play() {
        let (mut host, mut guest) = pair();
        let mut history = Vec::new();
        for round in 1..=3 {
            let host_move = host.legal_maneuvers()[0].id.clone();
            let guest_move = guest.legal_maneuvers()[0].id.clone();
            host.apply_reveal(round, &host_move, &guest_move).unwrap();
            guest.apply_reveal(round, &host_move, &guest_move).unwrap();
            history.push(RevealedMoves {
                round,
                host_move,
                guest_move,
            });
            if host.is_over() {
                break;
            }
        }

        let (_, mut rejoined) = pair();
        rejoined.replay(&history).unwrap();
        assert_eq!(rejoined.digest(), guest.digest());
        assert_eq!(rejoined.battle().round(), guest.battle().round());
    }
}
