//! Characters (immutable definitions) and their per-round combat state.

use std::sync::Arc;

use crate::book::{Book, PageNumber};
use crate::effect::DamageModifier;
use crate::maneuver::Maneuver;
use crate::restriction::Restriction;

/// Immutable character definition: catalog plus book.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Character {
    pub id: String,
    pub name: String,
    /// Relative height; feeds the height modifier on orange/red/blue attacks.
    pub height: i32,
    pub max_body_points: i32,
    pub maneuvers: Vec<Maneuver>,
    pub book: Book,
}

impl Character {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        height: i32,
        max_body_points: i32,
        maneuvers: Vec<Maneuver>,
        book: Book,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            height,
            max_body_points,
            maneuvers,
            book,
        }
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn maneuver(&self, id: &str) -> Option<&Maneuver> {
        self.maneuvers.iter().find(|maneuver| maneuver.id == id)
    }
}

/// Snapshot of one combatant between exchanges.
///
/// The resolver never mutates a snapshot in place; each exchange produces a
/// fresh value so history entries stay faithful.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterState {
    /// May drop to zero or below, which ends the battle.
    pub body_points: i32,
    pub max_body_points: i32,
    /// Shared with the opponent after every exchange.
    pub is_extended_range: bool,
    pub has_weapon: bool,
    /// Rebuilt from scratch every exchange.
    pub active_restrictions: Vec<Restriction>,
    /// Rebuilt from scratch every exchange.
    pub damage_modifiers: Vec<DamageModifier>,
    pub current_picture: Option<PageNumber>,
}

impl CharacterState {
    /// Opening state: full health, armed, at extended range and limited to
    /// extended-range maneuvers.
    pub fn initial(character: &Character) -> Self {
        Self {
            body_points: character.max_body_points,
            max_body_points: character.max_body_points,
            is_extended_range: true,
            has_weapon: true,
            active_restrictions: vec![Restriction::extended_range_only()],
            damage_modifiers: Vec::new(),
            current_picture: None,
        }
    }

    pub fn is_down(&self) -> bool {
        self.body_points <= 0
    }

    /// Raises body points without exceeding the maximum.
    pub fn heal(&mut self, amount: i32) {
        self.body_points = self.body_points.saturating_add(amount).min(self.max_body_points);
    }

    pub fn has_restriction(&self, restriction: &Restriction) -> bool {
        self.active_restrictions.contains(restriction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healing_never_exceeds_maximum() {
        let character = Character::new("c", "C", 4, 10, Vec::new(), Book::default());
        let mut state = CharacterState::initial(&character);
        state.body_points = 8;
        state.heal(5);
        assert_eq!(state.body_points, 10);

        state.body_points = -2;
        state.heal(1);
        assert_eq!(state.body_points, -1);
    }

    #[test]
    fn initial_state_opens_at_extended_range() {
        let character = Character::new("c", "C", 4, 12, Vec::new(), Book::default());
        let state = CharacterState::initial(&character);
        assert!(state.is_extended_range);
        assert!(state.has_weapon);
        assert_eq!(
            state.active_restrictions,
            vec![Restriction::extended_range_only()]
        );
        assert_eq!(state.body_points, 12);
    }
}
