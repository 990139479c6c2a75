//! Effect application.
//!
//! The next state of a combatant is built from its previous snapshot and its
//! own result page:
//!
//! 1. restrictions and damage modifiers from the previous round are dropped
//! 2. the page's restriction (if any) becomes the only active restriction
//! 3. range follows the page, and the exchange damage is subtracted
//! 4. each effect is folded in page order through [`apply_effect`]

use crate::book::PicturePage;
use crate::character::CharacterState;
use crate::effect::{DamageModifier, Effect, HealingCondition};
use crate::restriction::Restriction;

/// Builds the state that follows `previous` after landing on `page`.
pub(super) fn next_state(
    previous: &CharacterState,
    page: &PicturePage,
    damage_taken: i32,
) -> CharacterState {
    let active_restrictions = if page.restriction.is_none() {
        Vec::new()
    } else {
        vec![page.restriction.clone()]
    };

    let start = CharacterState {
        body_points: previous.body_points.saturating_sub(damage_taken),
        max_body_points: previous.max_body_points,
        is_extended_range: page.is_extended_range,
        has_weapon: previous.has_weapon,
        active_restrictions,
        damage_modifiers: Vec::new(),
        current_picture: Some(page.page_number),
    };

    page.effects
        .iter()
        .fold(start, |state, effect| apply_effect(state, effect, damage_taken))
}

/// Applies a single effect. `damage_taken` is this round's exchange damage.
pub(super) fn apply_effect(
    mut state: CharacterState,
    effect: &Effect,
    damage_taken: i32,
) -> CharacterState {
    match effect {
        Effect::Damage { amount } => {
            state.body_points = state.body_points.saturating_sub(*amount);
        }

        Effect::Healing { amount, condition } => {
            let blocked = matches!(condition, Some(HealingCondition::IfNoDamageTaken))
                && damage_taken > 0;
            if !blocked {
                state.heal(*amount);
            }
        }

        Effect::NextTurnDamageModifier {
            amount,
            colors,
            categories,
        } => {
            state.damage_modifiers.push(DamageModifier {
                amount: *amount,
                colors: colors.clone(),
                categories: categories.clone(),
            });
        }

        Effect::LoseWeapon => state.has_weapon = false,
        Effect::RetrieveWeapon => state.has_weapon = true,

        Effect::NoExtendedRange => {
            state
                .active_restrictions
                .push(Restriction::no_extended_range());
        }

        Effect::OnlyExtendedRange => {
            state
                .active_restrictions
                .push(Restriction::extended_range_only());
        }

        Effect::SetRange { extended } => state.is_extended_range = *extended,

        // Carried by the data model only; resolution ignores it.
        Effect::AlternateResult { .. } => {}
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maneuver::Color;

    fn previous() -> CharacterState {
        CharacterState {
            body_points: 10,
            max_body_points: 12,
            is_extended_range: true,
            has_weapon: true,
            active_restrictions: vec![Restriction::extended_range_only()],
            damage_modifiers: vec![DamageModifier::flat(3)],
            current_picture: Some(1),
        }
    }

    #[test]
    fn previous_round_state_is_replaced() {
        let page = PicturePage::new(101, "Closing", false)
            .with_restriction(Restriction::no_color([Color::Red]));
        let next = next_state(&previous(), &page, 2);

        assert_eq!(next.body_points, 8);
        assert!(!next.is_extended_range);
        assert_eq!(
            next.active_restrictions,
            vec![Restriction::no_color([Color::Red])]
        );
        assert!(next.damage_modifiers.is_empty());
        assert_eq!(next.current_picture, Some(101));
    }

    #[test]
    fn effects_fold_in_order() {
        let page = PicturePage::new(102, "Leaping clear", false)
            .with_effect(Effect::Damage { amount: 1 })
            .with_effect(Effect::Healing {
                amount: 5,
                condition: None,
            })
            .with_effect(Effect::LoseWeapon)
            .with_effect(Effect::SetRange { extended: true })
            .with_effect(Effect::OnlyExtendedRange)
            .with_effect(Effect::AlternateResult { page: 7 });
        let next = next_state(&previous(), &page, 0);

        // 10 - 1 + 5 clamps to 12
        assert_eq!(next.body_points, 12);
        assert!(!next.has_weapon);
        assert!(next.is_extended_range);
        assert_eq!(
            next.active_restrictions,
            vec![Restriction::extended_range_only()]
        );
    }

    #[test]
    fn conditional_healing_skipped_after_damage() {
        let page = PicturePage::new(103, "Blocked", false).with_effect(Effect::Healing {
            amount: 1,
            condition: Some(HealingCondition::IfNoDamageTaken),
        });

        assert_eq!(next_state(&previous(), &page, 0).body_points, 11);
        assert_eq!(next_state(&previous(), &page, 3).body_points, 7);
    }

    #[test]
    fn modifiers_and_range_restrictions_are_queued() {
        let page = PicturePage::new(104, "Exposed", false)
            .with_effect(Effect::NextTurnDamageModifier {
                amount: 1,
                colors: [Color::Red].into(),
                categories: Default::default(),
            })
            .with_effect(Effect::NoExtendedRange)
            .with_effect(Effect::RetrieveWeapon);
        let mut prev = previous();
        prev.has_weapon = false;
        let next = next_state(&prev, &page, 0);

        assert!(next.has_weapon);
        assert_eq!(next.damage_modifiers.len(), 1);
        assert_eq!(next.damage_modifiers[0].amount, 1);
        assert_eq!(
            next.active_restrictions,
            vec![Restriction::no_extended_range()]
        );
    }

    #[test]
    fn extreme_amounts_saturate() {
        let mut prev = previous();
        prev.body_points = i32::MIN + 1;
        let page = PicturePage::new(105, "Crushed", false)
            .with_effect(Effect::Damage { amount: i32::MAX })
            .with_effect(Effect::Healing {
                amount: i32::MAX,
                condition: None,
            });

        let next = next_state(&prev, &page, i32::MAX);
        // MIN after both hits, then healed by MAX to -1
        assert_eq!(next.body_points, -1);
    }
}
