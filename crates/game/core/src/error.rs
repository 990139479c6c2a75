//! Common error infrastructure for game-core.
//!
//! Two kinds of failure exist in the engine:
//!
//! - [`BattleError`]: the caller asked for something the state machine does not
//!   allow (resolving a finished battle, playing an unknown or illegal move).
//! - [`DataDefect`]: the book data could not answer a lookup. These are never
//!   returned as errors. The resolver substitutes a fallback page and records
//!   the defect on the exchange, because a failure raised on only one peer of
//!   a synchronized battle is worse than a wrong but identical result.

use crate::book::PageNumber;

/// Severity level of an error, used for categorization and logging priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Invalid input, should not retry without changes.
    Validation,

    /// Unexpected inconsistency in content data. Indicates a bug in the data
    /// and should be investigated.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

/// Common trait for all game-core errors.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier for this error variant, useful for metrics and tests.
    fn error_code(&self) -> &'static str;
}

/// Rejected battle operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleError {
    #[error("battle is over after round {round}")]
    GameOver { round: u32 },

    #[error("character {character} has no maneuver {maneuver}")]
    UnknownManeuver { character: String, maneuver: String },

    #[error("maneuver {maneuver} is not legal for {character} in round {round}")]
    IllegalManeuver {
        character: String,
        maneuver: String,
        round: u32,
    },
}

impl GameError for BattleError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::GameOver { .. } => "BATTLE_GAME_OVER",
            Self::UnknownManeuver { .. } => "BATTLE_UNKNOWN_MANEUVER",
            Self::IllegalManeuver { .. } => "BATTLE_ILLEGAL_MANEUVER",
        }
    }
}

/// Book data that could not answer a lookup during resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataDefect {
    #[error("{character}: lookup page {page} does not exist")]
    MissingLookupPage { character: String, page: PageNumber },

    #[error("{character}: lookup page {lookup_page} has no entry for opponent page {opponent_page}")]
    MissingMapping {
        character: String,
        lookup_page: PageNumber,
        opponent_page: PageNumber,
    },

    #[error("{character}: picture page {page} does not exist")]
    MissingPicturePage { character: String, page: PageNumber },

    #[error("{character}: book has no picture pages to fall back on")]
    EmptyBook { character: String },
}

impl GameError for DataDefect {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingLookupPage { .. } => "DATA_MISSING_LOOKUP_PAGE",
            Self::MissingMapping { .. } => "DATA_MISSING_MAPPING",
            Self::MissingPicturePage { .. } => "DATA_MISSING_PICTURE_PAGE",
            Self::EmptyBook { .. } => "DATA_EMPTY_BOOK",
        }
    }
}
