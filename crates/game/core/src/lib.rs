//! Deterministic combat-book rules shared by every peer.
//!
//! `game-core` defines the data model (maneuvers, books, restrictions, effects),
//! the pure exchange resolver, and the [`Battle`] state machine. Nothing here
//! performs I/O or draws randomness: two peers holding the same characters and
//! feeding the same maneuver pairs compute identical battles.
pub mod battle;
pub mod book;
pub mod character;
pub mod config;
#[cfg(feature = "serde")]
pub mod digest;
pub mod effect;
pub mod engine;
pub mod error;
pub mod legal;
pub mod maneuver;
pub mod oracle;
pub mod restriction;

#[cfg(test)]
mod fixtures;

pub use battle::{Battle, BattleExchange, BattleStatus, Combatant, ExchangeResult, Outcome, Side};
pub use book::{Book, LookupPage, PageNumber, PicturePage};
pub use character::{Character, CharacterState};
pub use config::GameConfig;
#[cfg(feature = "serde")]
pub use digest::state_digest;
pub use effect::{DamageModifier, Effect, HealingCondition};
pub use engine::resolve_exchange;
pub use error::{BattleError, DataDefect, ErrorSeverity, GameError};
pub use legal::{is_playable, legal_maneuvers, weapon_allows};
pub use maneuver::{Category, Color, Maneuver};
pub use oracle::{CharacterOracle, StaticOracle};
pub use restriction::{Restriction, is_legal, passes_all};
