//! Book validation.
//!
//! Two passes:
//!
//! - [`validate_character`] checks one book in isolation: every maneuver page
//!   has a lookup page, every mapping points at an existing picture page, and
//!   the fallback page exists.
//! - [`explore_matchup`] walks every abstract state two characters can reach
//!   against each other (body points pinned at maximum so the walk never
//!   ends on a knockout) and reports lookup gaps the resolver would have
//!   papered over, plus states in which a side has no legal maneuver.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use game_core::{
    Battle, Book, Character, CharacterState, Combatant, DataDefect, Side, legal_maneuvers,
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{character}: maneuver '{maneuver}' uses page {page}, which has no lookup page")]
    MissingLookupPage {
        character: String,
        maneuver: String,
        page: u32,
    },

    #[error("{character}: lookup page {lookup_page} maps {opponent_page} to missing picture {result_page}")]
    DanglingMapping {
        character: String,
        lookup_page: u32,
        opponent_page: u32,
        result_page: u32,
    },

    #[error("{character}: fallback picture page {page} is missing")]
    MissingFallback { character: String, page: u32 },

    #[error("{character} vs {opponent}: {defect}")]
    UnresolvedExchange {
        character: String,
        opponent: String,
        defect: DataDefect,
    },

    #[error("{character} vs {opponent}: no legal maneuvers (extended range: {extended_range})")]
    EmptyLegalSet {
        character: String,
        opponent: String,
        extended_range: bool,
    },
}

/// Result of walking one matchup.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    pub states_explored: usize,
    pub exchanges_resolved: usize,
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, error: ValidationError) {
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }
}

/// Static checks on a single character's book.
pub fn validate_character(character: &Character) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let book: &Book = &character.book;

    if book.picture(Book::FALLBACK_PAGE).is_none() {
        errors.push(ValidationError::MissingFallback {
            character: character.id.clone(),
            page: Book::FALLBACK_PAGE,
        });
    }

    for maneuver in &character.maneuvers {
        let pages = [Some(maneuver.normal_page), maneuver.extended_page];
        for page in pages.into_iter().flatten() {
            if book.lookup(page).is_none() {
                let error = ValidationError::MissingLookupPage {
                    character: character.id.clone(),
                    maneuver: maneuver.id.clone(),
                    page,
                };
                if !errors.contains(&error) {
                    errors.push(error);
                }
            }
        }
    }

    for lookup in book.lookups() {
        for (&opponent_page, &result_page) in &lookup.mapping {
            if result_page != 0 && book.picture(result_page).is_none() {
                errors.push(ValidationError::DanglingMapping {
                    character: character.id.clone(),
                    lookup_page: lookup.page_number,
                    opponent_page,
                    result_page,
                });
            }
        }
    }

    errors
}

/// Breadth-first walk over every reachable abstract state of `player1`
/// against `player2`.
pub fn explore_matchup(player1: &Arc<Character>, player2: &Arc<Character>) -> ValidationReport {
    let mut report = ValidationReport::default();
    let start = (
        CharacterState::initial(player1),
        CharacterState::initial(player2),
    );

    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(start.clone());
    queue.push_back(start);

    while let Some((state1, state2)) = queue.pop_front() {
        report.states_explored += 1;

        let battle = Battle::resume(
            "validate",
            Combatant {
                character: Arc::clone(player1),
                state: state1.clone(),
            },
            Combatant {
                character: Arc::clone(player2),
                state: state2.clone(),
            },
            1,
        );

        let moves1: Vec<_> = legal_maneuvers(player1, &state1).collect();
        let moves2: Vec<_> = legal_maneuvers(player2, &state2).collect();
        if moves1.is_empty() {
            report.push(empty_legal_set(player1, player2, &state1));
        }
        if moves2.is_empty() {
            report.push(empty_legal_set(player2, player1, &state2));
        }

        for m1 in &moves1 {
            for m2 in &moves2 {
                // Body points are pinned, so resolve never sees a finished battle.
                let Ok(exchange) = battle.resolve(m1, m2) else {
                    continue;
                };
                report.exchanges_resolved += 1;

                for (side, owner, opponent) in [
                    (Side::Player1, player1, player2),
                    (Side::Player2, player2, player1),
                ] {
                    for defect in &exchange.result(side).defects {
                        report.push(ValidationError::UnresolvedExchange {
                            character: owner.id.clone(),
                            opponent: opponent.id.clone(),
                            defect: defect.clone(),
                        });
                    }
                }

                let next = (
                    abstract_state(exchange.player1.state),
                    abstract_state(exchange.player2.state),
                );
                if seen.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }
    }

    report
}

/// Validates every character alone and every ordered pair (including mirror
/// matches).
pub fn validate_roster(characters: &[Arc<Character>]) -> ValidationReport {
    let mut report = ValidationReport::default();
    for character in characters {
        for error in validate_character(character) {
            report.push(error);
        }
    }
    for player1 in characters {
        for player2 in characters {
            let matchup = explore_matchup(player1, player2);
            report.states_explored += matchup.states_explored;
            report.exchanges_resolved += matchup.exchanges_resolved;
            for error in matchup.errors {
                report.push(error);
            }
        }
    }
    report
}

fn abstract_state(mut state: CharacterState) -> CharacterState {
    state.body_points = state.max_body_points;
    state.current_picture = None;
    state
}

fn empty_legal_set(
    character: &Character,
    opponent: &Character,
    state: &CharacterState,
) -> ValidationError {
    ValidationError::EmptyLegalSet {
        character: character.id.clone(),
        opponent: opponent.id.clone(),
        extended_range: state.is_extended_range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{Category, Color, LookupPage, Maneuver, PicturePage, Restriction};

    fn duelist(lookup_entries: &[(u32, u32)]) -> Arc<Character> {
        let maneuvers = vec![
            Maneuver::new("step", "Step", Category::ExtendedRange, Color::White, 2)
                .with_extended_page(2),
        ];
        let mut lookup = LookupPage::new(2);
        for &(opponent, result) in lookup_entries {
            lookup = lookup.with_entry(opponent, result);
        }
        let pictures = [
            PicturePage::new(1, "Standoff", true)
                .with_restriction(Restriction::extended_range_only()),
            PicturePage::new(101, "Closing", false)
                .with_restriction(Restriction::no_color([Color::White])),
        ];
        Character::new("duelist", "Duelist", 4, 8, maneuvers, Book::new(pictures, [lookup]))
            .into_shared()
    }

    #[test]
    fn static_checks_flag_dangling_mapping() {
        let character = duelist(&[(2, 77)]);
        assert_eq!(
            validate_character(&character),
            vec![ValidationError::DanglingMapping {
                character: "duelist".into(),
                lookup_page: 2,
                opponent_page: 2,
                result_page: 77,
            }]
        );
    }

    #[test]
    fn exploration_reports_dead_end_states() {
        // Stepping closes to normal range where the only maneuver is forbidden.
        let character = duelist(&[(2, 101)]);
        let report = explore_matchup(&character, &character);

        assert!(!report.is_clean());
        assert!(report.errors.iter().any(|e| matches!(
            e,
            ValidationError::EmptyLegalSet {
                extended_range: false,
                ..
            }
        )));
    }

    #[test]
    fn exploration_reports_missing_mapping() {
        let character = duelist(&[]);
        let report = explore_matchup(&character, &character);
        assert!(report.errors.iter().any(|e| matches!(
            e,
            ValidationError::UnresolvedExchange {
                defect: DataDefect::MissingMapping { .. },
                ..
            }
        )));
    }
}
