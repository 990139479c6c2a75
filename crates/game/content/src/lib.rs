//! Data-driven character content and loaders.
//!
//! This crate houses the bundled sample roster and provides loaders for
//! character data files:
//! - Character books (JSON: maneuver catalog, picture pages, lookup pages)
//! - Roster manifests (TOML: which characters are selectable)
//! - Game configuration (TOML)
//!
//! It also validates books against each other, so data gaps show up in tests
//! instead of as fallback pages mid-battle.

pub mod roster;
pub mod validate;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use roster::CharacterRoster;
pub use validate::{
    ValidationError, ValidationReport, explore_matchup, validate_character, validate_roster,
};

#[cfg(feature = "loaders")]
pub use loaders::{
    CharacterDefinition, CharacterLoader, ConfigLoader, ContentFactory, LoadError, LoadResult,
    RosterLoader, RosterManifest,
};
