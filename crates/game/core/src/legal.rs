//! Legal-move generation.
//!
//! The legal set is the catalog filtered by the weapon rule and by every
//! active restriction. An empty legal set outside of a finished battle means
//! the book data is broken; callers treat it as a defect, not a game state.

use crate::character::{Character, CharacterState};
use crate::config::GameConfig;
use crate::maneuver::{Category, Maneuver};
use crate::restriction::passes_all;

/// Returns true if `maneuver` can be played with the current weapon status.
///
/// Without a weapon only jumps, rages, weapon-free extended-range moves, and
/// kick/retrieve specials remain.
pub fn weapon_allows(maneuver: &Maneuver, has_weapon: bool) -> bool {
    if has_weapon {
        return true;
    }

    match maneuver.category {
        category if GameConfig::WEAPONLESS_CATEGORIES.contains(&category) => true,
        Category::ExtendedRange => !maneuver.color.is_attack(),
        Category::Special => {
            let name = maneuver.name.to_ascii_uppercase();
            GameConfig::WEAPONLESS_SPECIAL_KEYWORDS
                .iter()
                .any(|keyword| name.contains(keyword))
        }
        _ => false,
    }
}

/// Returns true if `maneuver` is playable from `state`.
pub fn is_playable(maneuver: &Maneuver, state: &CharacterState) -> bool {
    weapon_allows(maneuver, state.has_weapon) && passes_all(maneuver, &state.active_restrictions)
}

/// Iterates the catalog entries playable from `state`, in catalog order.
pub fn legal_maneuvers<'a>(
    character: &'a Character,
    state: &'a CharacterState,
) -> impl Iterator<Item = &'a Maneuver> + 'a {
    character
        .maneuvers
        .iter()
        .filter(move |maneuver| is_playable(maneuver, state))
}
