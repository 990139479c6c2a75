//! Asynchronous abstraction for picking a maneuver each round.
//!
//! Peers plug in [`MoveProvider`] implementations so a battle can be driven
//! by human input, scripted fixtures, or automated players.
use async_trait::async_trait;
use game_core::{Battle, Side};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::Mutex;

use super::errors::{Result, RuntimeError};

/// Trait for choosing the next maneuver of one side.
///
/// Implementations only see the local replica and must return an id that is
/// legal for `side` in the battle's current round.
#[async_trait]
pub trait MoveProvider: Send + Sync {
    async fn choose_maneuver(&self, battle: &Battle, side: Side) -> Result<String>;
}

/// Always plays the first legal maneuver in catalog order.
/// Useful for testing or as a fallback.
pub struct FirstLegalMoveProvider;

#[async_trait]
impl MoveProvider for FirstLegalMoveProvider {
    async fn choose_maneuver(&self, battle: &Battle, side: Side) -> Result<String> {
        battle
            .legal_maneuvers(side)
            .first()
            .map(|maneuver| maneuver.id.clone())
            .ok_or(RuntimeError::NoLegalManeuver {
                round: battle.round(),
            })
    }
}

/// Uniformly random legal maneuver.
pub struct RandomMoveProvider {
    rng: Mutex<StdRng>,
}

impl RandomMoveProvider {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl Default for RandomMoveProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MoveProvider for RandomMoveProvider {
    async fn choose_maneuver(&self, battle: &Battle, side: Side) -> Result<String> {
        let legal = battle.legal_maneuvers(side);
        let mut rng = self.rng.lock().await;
        legal
            .choose(&mut *rng)
            .map(|maneuver| maneuver.id.clone())
            .ok_or(RuntimeError::NoLegalManeuver {
                round: battle.round(),
            })
    }
}
