//! Battle state machine.
//!
//! ```text
//! AwaitingMoves --resolve--> AwaitingMoves | GameOver
//! GameOver --reset/rematch--> AwaitingMoves
//! ```
//!
//! There are no intermediate "selecting" or "resolving" states: an exchange is
//! computed synchronously from a complete pair of maneuvers and then applied.

use std::sync::Arc;

use crate::book::PageNumber;
use crate::character::{Character, CharacterState};
use crate::engine::resolve_exchange;
use crate::error::{BattleError, DataDefect};
use crate::legal;
use crate::maneuver::Maneuver;

/// One of the two seats in a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum BattleStatus {
    #[default]
    AwaitingMoves,
    GameOver,
}

/// Status and winner following an exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    pub status: BattleStatus,
    pub winner: Option<Side>,
}

impl Outcome {
    /// Evaluates the terminal condition for a pair of post-exchange states.
    ///
    /// The battle ends when either side is at or below zero body points. A
    /// lone knocked-out side loses. When both are down the strictly higher
    /// body points win, and an exact tie goes to player 2.
    pub fn evaluate(player1: &CharacterState, player2: &CharacterState) -> Self {
        let winner = match (player1.is_down(), player2.is_down()) {
            (false, false) => None,
            (true, false) => Some(Side::Player2),
            (false, true) => Some(Side::Player1),
            (true, true) if player1.body_points > player2.body_points => Some(Side::Player1),
            // Tie goes to player 2. Unconfirmed against the tabletop rules.
            (true, true) => Some(Side::Player2),
        };

        Self {
            status: if winner.is_some() {
                BattleStatus::GameOver
            } else {
                BattleStatus::AwaitingMoves
            },
            winner,
        }
    }
}

/// A character together with its current state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combatant {
    pub character: Arc<Character>,
    pub state: CharacterState,
}

impl Combatant {
    pub fn fresh(character: Arc<Character>) -> Self {
        let state = CharacterState::initial(&character);
        Self { character, state }
    }
}

/// Outcome of an exchange for one side.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExchangeResult {
    /// Lookup page this side played (the page the opponent's book is keyed by).
    pub lookup_page: PageNumber,
    pub result_page: PageNumber,
    pub title: String,
    pub damage_taken: i32,
    /// State after the exchange.
    pub state: CharacterState,
    /// Book gaps hit while resolving this side.
    pub defects: Vec<DataDefect>,
}

/// One round's move pair and resolved outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleExchange {
    pub round: u32,
    pub player1_maneuver: Maneuver,
    pub player2_maneuver: Maneuver,
    pub player1: ExchangeResult,
    pub player2: ExchangeResult,
    pub outcome: Outcome,
    /// Wall-clock stamp set by the caller; not part of the deterministic result.
    pub timestamp_ms: Option<i64>,
}

impl BattleExchange {
    pub fn result(&self, side: Side) -> &ExchangeResult {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    /// Same exchange with the timestamp cleared, for determinism comparisons.
    pub fn without_timestamp(&self) -> Self {
        Self {
            timestamp_ms: None,
            ..self.clone()
        }
    }

    pub fn defects(&self) -> impl Iterator<Item = &DataDefect> {
        self.player1.defects.iter().chain(self.player2.defects.iter())
    }
}

/// A two-combatant battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Battle {
    id: String,
    player1: Combatant,
    player2: Combatant,
    round: u32,
    status: BattleStatus,
    history: Vec<BattleExchange>,
    winner: Option<Side>,
}

impl Battle {
    /// Starts a battle at round 1 with fresh states for both characters.
    pub fn new(id: impl Into<String>, player1: Arc<Character>, player2: Arc<Character>) -> Self {
        Self {
            id: id.into(),
            player1: Combatant::fresh(player1),
            player2: Combatant::fresh(player2),
            round: 1,
            status: BattleStatus::AwaitingMoves,
            history: Vec::new(),
            winner: None,
        }
    }

    /// Rebuilds an in-progress battle from two combatant snapshots.
    ///
    /// Status and winner are derived from the states, so a snapshot taken
    /// after a knockout comes back as finished. History starts empty.
    pub fn resume(id: impl Into<String>, player1: Combatant, player2: Combatant, round: u32) -> Self {
        let outcome = Outcome::evaluate(&player1.state, &player2.state);
        Self {
            id: id.into(),
            player1,
            player2,
            round: round.max(1),
            status: outcome.status,
            history: Vec::new(),
            winner: outcome.winner,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Round awaiting moves (or the round after the final exchange).
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn status(&self) -> BattleStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status == BattleStatus::GameOver
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn history(&self) -> &[BattleExchange] {
        &self.history
    }

    pub fn last_exchange(&self) -> Option<&BattleExchange> {
        self.history.last()
    }

    pub fn player1(&self) -> &Combatant {
        &self.player1
    }

    pub fn player2(&self) -> &Combatant {
        &self.player2
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    /// Maneuvers `side` may play right now.
    pub fn legal_maneuvers(&self, side: Side) -> Vec<&Maneuver> {
        let combatant = self.combatant(side);
        legal::legal_maneuvers(&combatant.character, &combatant.state).collect()
    }

    /// Looks up `maneuver_id` in `side`'s catalog and checks it is legal now.
    pub fn select(&self, side: Side, maneuver_id: &str) -> Result<&Maneuver, BattleError> {
        let combatant = self.combatant(side);
        let maneuver = combatant.character.maneuver(maneuver_id).ok_or_else(|| {
            BattleError::UnknownManeuver {
                character: combatant.character.id.clone(),
                maneuver: maneuver_id.to_owned(),
            }
        })?;

        if !legal::is_playable(maneuver, &combatant.state) {
            return Err(BattleError::IllegalManeuver {
                character: combatant.character.id.clone(),
                maneuver: maneuver_id.to_owned(),
                round: self.round,
            });
        }

        Ok(maneuver)
    }

    /// Computes the next exchange without applying it.
    pub fn resolve(
        &self,
        player1_maneuver: &Maneuver,
        player2_maneuver: &Maneuver,
    ) -> Result<BattleExchange, BattleError> {
        self.ensure_awaiting()?;
        Ok(resolve_exchange(self, player1_maneuver, player2_maneuver))
    }

    /// Commits a resolved exchange: new states, round + 1, status, winner,
    /// and a history entry.
    pub fn apply(&mut self, exchange: BattleExchange) -> Result<&BattleExchange, BattleError> {
        self.ensure_awaiting()?;

        self.player1.state = exchange.player1.state.clone();
        self.player2.state = exchange.player2.state.clone();
        self.round += 1;
        self.status = exchange.outcome.status;
        self.winner = exchange.outcome.winner;

        let index = self.history.len();
        self.history.push(exchange);
        Ok(&self.history[index])
    }

    /// Resolves and applies one round, stamping the exchange with `timestamp_ms`.
    pub fn play_round(
        &mut self,
        player1_maneuver: &Maneuver,
        player2_maneuver: &Maneuver,
        timestamp_ms: Option<i64>,
    ) -> Result<&BattleExchange, BattleError> {
        let mut exchange = self.resolve(player1_maneuver, player2_maneuver)?;
        exchange.timestamp_ms = timestamp_ms;
        self.apply(exchange)
    }

    /// Throws away all progress and restarts with fresh states.
    pub fn reset(&mut self) {
        *self = self.rematch();
    }

    /// A fresh battle between the same characters in the same seats.
    pub fn rematch(&self) -> Self {
        Self::new(
            self.id.clone(),
            Arc::clone(&self.player1.character),
            Arc::clone(&self.player2.character),
        )
    }

    /// The same battle seen from the other seat.
    ///
    /// Histories are not mirrored; the swapped view is meant for resolving the
    /// next exchange from the opponent's framing.
    pub fn swapped(&self) -> Self {
        Self {
            id: self.id.clone(),
            player1: self.player2.clone(),
            player2: self.player1.clone(),
            round: self.round,
            status: self.status,
            history: Vec::new(),
            winner: self.winner.map(Side::opponent),
        }
    }

    fn ensure_awaiting(&self) -> Result<(), BattleError> {
        if self.is_over() {
            return Err(BattleError::GameOver {
                round: self.round.saturating_sub(1),
            });
        }
        Ok(())
    }
}
