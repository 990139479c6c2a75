//! Exchange resolution.
//!
//! [`resolve_exchange`] is the pure transition at the heart of the game: given
//! a battle and one maneuver per side it returns the complete
//! [`BattleExchange`] without touching the battle. It performs no I/O and uses
//! no randomness, so two peers feeding it the same inputs get the same output.
//!
//! Per side the pipeline is: page selection → own-book lookup keyed by the
//! opponent's page → damage → effect fold. The two next states are then
//! range-resynchronized and the terminal outcome is evaluated.

mod damage;
mod effects;
mod lookup;
mod range;

use crate::battle::{Battle, BattleExchange, ExchangeResult, Outcome};
use crate::book::{PageNumber, PicturePage};
use crate::character::CharacterState;
use crate::error::DataDefect;
use crate::maneuver::Maneuver;

use damage::Incoming;

/// Resolves one exchange of `battle` with the given maneuvers.
///
/// Legality is not checked here; see [`Battle::select`]. Book gaps never fail
/// and are reported on each [`ExchangeResult::defects`].
pub fn resolve_exchange(
    battle: &Battle,
    player1_maneuver: &Maneuver,
    player2_maneuver: &Maneuver,
) -> BattleExchange {
    let one = battle.player1();
    let two = battle.player2();

    let page1 = player1_maneuver.page_at(one.state.is_extended_range);
    let page2 = player2_maneuver.page_at(two.state.is_extended_range);

    let mut defects1 = Vec::new();
    let mut defects2 = Vec::new();
    let result1 = lookup::result_page(&one.character, page1, page2, &mut defects1);
    let result2 = lookup::result_page(&two.character, page2, page1, &mut defects2);

    let taken1 = damage::damage_taken(
        &Incoming {
            attacker: &two.character,
            maneuver: player2_maneuver,
            attacker_result: &result2,
        },
        &one.character,
        &one.state,
    );
    let taken2 = damage::damage_taken(
        &Incoming {
            attacker: &one.character,
            maneuver: player1_maneuver,
            attacker_result: &result1,
        },
        &two.character,
        &two.state,
    );

    let mut next1 = effects::next_state(&one.state, &result1, taken1);
    let mut next2 = effects::next_state(&two.state, &result2, taken2);
    range::resynchronize(&mut next1, &mut next2);

    let outcome = Outcome::evaluate(&next1, &next2);

    BattleExchange {
        round: battle.round(),
        player1_maneuver: player1_maneuver.clone(),
        player2_maneuver: player2_maneuver.clone(),
        player1: side_result(page1, &result1, taken1, next1, defects1),
        player2: side_result(page2, &result2, taken2, next2, defects2),
        outcome,
        timestamp_ms: None,
    }
}

fn side_result(
    lookup_page: PageNumber,
    result: &PicturePage,
    damage_taken: i32,
    state: CharacterState,
    defects: Vec<DataDefect>,
) -> ExchangeResult {
    ExchangeResult {
        lookup_page,
        result_page: result.page_number,
        title: result.title.clone(),
        damage_taken,
        state,
        defects,
    }
}
