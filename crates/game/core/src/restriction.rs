//! Restriction evaluator.
//!
//! Restrictions are a small closed predicate language over maneuvers. Picture
//! pages carry one restriction tree each; the evaluator walks it recursively.
//! Trees are shallow in practice, so nothing is memoized.

use std::collections::BTreeSet;

use crate::maneuver::{Category, Color, Maneuver};

/// Predicate tree limiting which maneuvers may be played next round.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Restriction {
    #[default]
    None,
    NoCategory(BTreeSet<Category>),
    OnlyCategory(BTreeSet<Category>),
    NoColor(BTreeSet<Color>),
    OnlyColor(BTreeSet<Color>),
    /// Forbids maneuvers whose name contains the text (case-insensitive).
    NoName(String),
    /// Allows only maneuvers whose name contains the text (case-insensitive).
    OnlyName(String),
    And(Vec<Restriction>),
    Or(Vec<Restriction>),
}

impl Restriction {
    pub fn no_category(categories: impl IntoIterator<Item = Category>) -> Self {
        Self::NoCategory(categories.into_iter().collect())
    }

    pub fn only_category(categories: impl IntoIterator<Item = Category>) -> Self {
        Self::OnlyCategory(categories.into_iter().collect())
    }

    pub fn no_color(colors: impl IntoIterator<Item = Color>) -> Self {
        Self::NoColor(colors.into_iter().collect())
    }

    pub fn only_color(colors: impl IntoIterator<Item = Color>) -> Self {
        Self::OnlyColor(colors.into_iter().collect())
    }

    /// The restriction that locks a combatant into extended-range maneuvers.
    pub fn extended_range_only() -> Self {
        Self::only_category([Category::ExtendedRange])
    }

    /// The restriction that forbids extended-range maneuvers.
    pub fn no_extended_range() -> Self {
        Self::no_category([Category::ExtendedRange])
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns true if `maneuver` passes this restriction.
    pub fn allows(&self, maneuver: &Maneuver) -> bool {
        is_legal(maneuver, self)
    }
}

/// Evaluates `restriction` against `maneuver`.
///
/// An empty `And` passes and an empty `Or` fails, matching the usual identity
/// elements of conjunction and disjunction.
pub fn is_legal(maneuver: &Maneuver, restriction: &Restriction) -> bool {
    match restriction {
        Restriction::None => true,
        Restriction::NoCategory(set) => !set.contains(&maneuver.category),
        Restriction::OnlyCategory(set) => set.contains(&maneuver.category),
        Restriction::NoColor(set) => !set.contains(&maneuver.color),
        Restriction::OnlyColor(set) => set.contains(&maneuver.color),
        Restriction::NoName(text) => !maneuver.name_contains(text),
        Restriction::OnlyName(text) => maneuver.name_contains(text),
        Restriction::And(children) => children.iter().all(|child| is_legal(maneuver, child)),
        Restriction::Or(children) => children.iter().any(|child| is_legal(maneuver, child)),
    }
}

/// Returns true if `maneuver` passes every restriction in `active`.
pub fn passes_all(maneuver: &Maneuver, active: &[Restriction]) -> bool {
    active.iter().all(|restriction| is_legal(maneuver, restriction))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smash() -> Maneuver {
        Maneuver::new("smash", "Smash", Category::DownSwing, Color::Red, 12)
    }

    fn dodge() -> Maneuver {
        Maneuver::new("dodge", "Dodge", Category::ExtendedRange, Color::Yellow, 6)
            .with_extended_page(6)
    }

    #[test]
    fn leaf_variants() {
        assert!(is_legal(&smash(), &Restriction::None));
        assert!(!is_legal(
            &smash(),
            &Restriction::no_category([Category::DownSwing])
        ));
        assert!(is_legal(&dodge(), &Restriction::extended_range_only()));
        assert!(!is_legal(&smash(), &Restriction::extended_range_only()));
        assert!(!is_legal(&smash(), &Restriction::no_color([Color::Red])));
        assert!(is_legal(&dodge(), &Restriction::only_color([Color::Yellow])));
        assert!(!is_legal(&smash(), &Restriction::NoName("SMA".into())));
        assert!(is_legal(&dodge(), &Restriction::OnlyName("odg".into())));
    }

    #[test]
    fn composites_recurse() {
        let tree = Restriction::Or(vec![
            Restriction::And(vec![
                Restriction::no_color([Color::Red]),
                Restriction::NoName("fake".into()),
            ]),
            Restriction::only_category([Category::DownSwing]),
        ]);
        assert!(is_legal(&smash(), &tree));
        assert!(is_legal(&dodge(), &tree));

        let fake = Maneuver::new("fake", "Fake", Category::Fake, Color::Yellow, 20);
        assert!(!is_legal(&fake, &tree));
    }

    #[test]
    fn empty_composites_use_identity_elements() {
        assert!(is_legal(&smash(), &Restriction::And(vec![])));
        assert!(!is_legal(&smash(), &Restriction::Or(vec![])));
    }

    #[test]
    fn active_list_is_an_implicit_and() {
        let active = [
            Restriction::no_color([Color::Green]),
            Restriction::extended_range_only(),
        ];
        assert!(passes_all(&dodge(), &active));
        assert!(!passes_all(&smash(), &active));
        assert!(passes_all(&smash(), &[]));
    }
}
