//! Content loaders for reading character data from files.
//!
//! Character books are JSON documents; the roster manifest and game config
//! are TOML. Every loader returns [`LoadResult`] so callers get the file
//! path in the error chain.

pub mod character;
pub mod config;
pub mod factory;
pub mod roster;

pub use character::{CharacterDefinition, CharacterLoader};
pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use roster::{RosterEntry, RosterLoader, RosterManifest};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Structural problems in otherwise well-formed character files.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("character '{character}' lists maneuver '{maneuver}' more than once")]
    DuplicateManeuver { character: String, maneuver: String },

    #[error("character '{character}' defines {kind} page {page} more than once")]
    DuplicatePage {
        character: String,
        kind: &'static str,
        page: u32,
    },

    #[error("character '{character}' has max body points {value}; must be positive")]
    InvalidBodyPoints { character: String, value: i32 },

    #[error("roster entry '{expected}' points at a file defining '{found}'")]
    IdMismatch { expected: String, found: String },

    #[error("roster lists character '{0}' more than once")]
    DuplicateRosterEntry(String),

    #[error("roster is empty")]
    EmptyRoster,
}

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
