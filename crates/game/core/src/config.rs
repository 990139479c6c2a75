use crate::maneuver::{Category, Color};

/// Rule constants shared by the evaluator and the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Upper bound on rounds used by simulations and tests to detect stalls.
    pub max_rounds: u32,
}

impl GameConfig {
    // ===== fixed rules =====
    /// Attacks of these colors add `attacker.height - defender.height` to damage.
    pub const HEIGHT_SENSITIVE_COLORS: [Color; 3] = [Color::Orange, Color::Red, Color::Blue];
    /// Categories that stay legal without a weapon.
    pub const WEAPONLESS_CATEGORIES: [Category; 2] = [Category::Jump, Category::Rage];
    /// Special maneuvers whose names contain one of these stay legal without a weapon.
    pub const WEAPONLESS_SPECIAL_KEYWORDS: [&'static str; 2] = ["KICK", "RETRIEVE"];

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_ROUNDS: u32 = 500;

    pub fn new() -> Self {
        Self {
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_max_rounds(max_rounds: u32) -> Self {
        Self { max_rounds }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
