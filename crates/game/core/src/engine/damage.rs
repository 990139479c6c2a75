//! Damage computation for one side of an exchange.

use crate::book::PicturePage;
use crate::character::{Character, CharacterState};
use crate::maneuver::Maneuver;

/// Everything about the blow arriving at one combatant.
pub(super) struct Incoming<'a> {
    pub attacker: &'a Character,
    pub maneuver: &'a Maneuver,
    /// The attacker's own result page, which carries the damage it inflicts.
    pub attacker_result: &'a PicturePage,
}

/// Height bonus of the attacker, applied only to height-sensitive colors.
pub(super) fn height_modifier(attacker: &Character, defender: &Character, incoming: &Maneuver) -> i32 {
    if incoming.color.is_height_sensitive() {
        attacker.height.saturating_sub(defender.height)
    } else {
        0
    }
}

/// Sum of the defender's carried-over modifiers that match the incoming maneuver.
pub(super) fn carried_modifiers(defender: &CharacterState, incoming: &Maneuver) -> i32 {
    defender
        .damage_modifiers
        .iter()
        .filter(|modifier| modifier.applies_to(incoming))
        .fold(0i32, |total, modifier| total.saturating_add(modifier.amount))
}

/// Damage `defender` takes this exchange. Never negative; saturates at
/// `i32::MAX` for out-of-range book values.
pub(super) fn damage_taken(
    incoming: &Incoming<'_>,
    defender: &Character,
    defender_state: &CharacterState,
) -> i32 {
    let total = incoming
        .attacker_result
        .damage_or_zero()
        .saturating_add(incoming.maneuver.modifier)
        .saturating_add(height_modifier(incoming.attacker, defender, incoming.maneuver))
        .saturating_add(carried_modifiers(defender_state, incoming.maneuver));

    total.max(0)
}
