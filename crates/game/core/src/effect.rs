//! Closed set of status effects printed on picture pages.
//!
//! Effects are folded left to right over the next [`CharacterState`]; see
//! [`crate::engine`] for the transition applied by each variant.
//!
//! [`CharacterState`]: crate::character::CharacterState

use std::collections::BTreeSet;

use crate::book::PageNumber;
use crate::maneuver::{Category, Color, Maneuver};

/// Gate on a healing effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum HealingCondition {
    /// Heal only if the combatant took no damage this round.
    IfNoDamageTaken,
}

/// A single effect on a picture page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Effect {
    /// Direct loss of body points on top of the exchange damage.
    Damage { amount: i32 },
    Healing {
        amount: i32,
        #[cfg_attr(feature = "serde", serde(default))]
        condition: Option<HealingCondition>,
    },
    /// Adjusts the damage this combatant takes next round.
    NextTurnDamageModifier {
        amount: i32,
        #[cfg_attr(feature = "serde", serde(default))]
        colors: BTreeSet<Color>,
        #[cfg_attr(feature = "serde", serde(default))]
        categories: BTreeSet<Category>,
    },
    LoseWeapon,
    RetrieveWeapon,
    NoExtendedRange,
    OnlyExtendedRange,
    SetRange { extended: bool },
    /// Points at a different result page. Carried in the data, not resolved.
    AlternateResult { page: PageNumber },
}

/// Damage adjustment queued by [`Effect::NextTurnDamageModifier`].
///
/// Lives for exactly one round: it is consulted when computing the damage the
/// holder takes in the following exchange and then dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageModifier {
    pub amount: i32,
    /// Empty means any color.
    pub colors: BTreeSet<Color>,
    /// Empty means any category.
    pub categories: BTreeSet<Category>,
}

impl DamageModifier {
    pub fn flat(amount: i32) -> Self {
        Self {
            amount,
            colors: BTreeSet::new(),
            categories: BTreeSet::new(),
        }
    }

    /// Returns true if the incoming maneuver passes both filters.
    pub fn applies_to(&self, incoming: &Maneuver) -> bool {
        (self.colors.is_empty() || self.colors.contains(&incoming.color))
            && (self.categories.is_empty() || self.categories.contains(&incoming.category))
    }
}
