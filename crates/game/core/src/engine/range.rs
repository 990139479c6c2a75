//! Range resynchronization.
//!
//! Each side's next state is computed from its own page, so the two range
//! flags can disagree. Range is one shared fact: extended wins any
//! disagreement, and a combatant pulled back to extended range is locked into
//! extended-range maneuvers. Otherwise it could be offered a normal-range move
//! whose page has no entries for extended-range opponent pages.

use crate::character::CharacterState;
use crate::restriction::Restriction;

pub(super) fn resynchronize(player1: &mut CharacterState, player2: &mut CharacterState) {
    let extended = player1.is_extended_range || player2.is_extended_range;

    for state in [player1, player2] {
        state.is_extended_range = extended;

        let locked = Restriction::extended_range_only();
        if extended && !state.has_restriction(&locked) {
            state.active_restrictions = vec![locked];
        }
    }
}
