//! Maneuver catalog entries and their closed classification enums.
//!
//! A maneuver is immutable once loaded. Its category and color drive the
//! restriction evaluator, and its two page numbers select which lookup page
//! the owner consults at each range.

use crate::book::PageNumber;
use crate::config::GameConfig;

/// Broad family a maneuver belongs to.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Category {
    /// Moves made while the combatants are apart (closing, circling, retreating).
    ExtendedRange,
    DownSwing,
    SideSwing,
    Thrust,
    Fake,
    Defend,
    ProtectedAttack,
    Jump,
    Rage,
    /// Character-specific moves (kicks, weapon retrieval, ...).
    Special,
}

/// Color band printed on the maneuver card.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Color {
    Orange,
    Red,
    Blue,
    Yellow,
    Green,
    White,
    Black,
}

impl Color {
    /// Returns true for the colors whose damage depends on the height difference
    /// between attacker and defender.
    pub fn is_height_sensitive(self) -> bool {
        GameConfig::HEIGHT_SENSITIVE_COLORS.contains(&self)
    }

    /// Attack colors double as the height-sensitive set.
    ///
    /// An extended-range maneuver of any other color is a movement or defense
    /// move and stays available after the weapon is lost.
    pub fn is_attack(self) -> bool {
        self.is_height_sensitive()
    }
}

/// A single entry of a character's maneuver catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Maneuver {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub color: Color,
    /// Lookup page consulted at normal range.
    pub normal_page: PageNumber,
    /// Lookup page consulted at extended range, when the maneuver has one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub extended_page: Option<PageNumber>,
    /// Flat damage adjustment added to whatever this maneuver inflicts.
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifier: i32,
}

impl Maneuver {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        color: Color,
        normal_page: PageNumber,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            color,
            normal_page,
            extended_page: None,
            modifier: 0,
        }
    }

    #[must_use]
    pub fn with_extended_page(mut self, page: PageNumber) -> Self {
        self.extended_page = Some(page);
        self
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: i32) -> Self {
        self.modifier = modifier;
        self
    }

    /// Page this maneuver is played on at the given range.
    ///
    /// Falls back to the normal page when no extended page exists.
    pub fn page_at(&self, extended_range: bool) -> PageNumber {
        match self.extended_page {
            Some(page) if extended_range => page,
            _ => self.normal_page,
        }
    }

    /// Case-insensitive substring test against the maneuver name.
    pub fn name_contains(&self, needle: &str) -> bool {
        self.name
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase())
    }
}
