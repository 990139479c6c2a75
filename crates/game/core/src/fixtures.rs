//! Small hand-built books for unit tests.
//!
//! Two-range duel with four maneuvers:
//!
//! | maneuver | category       | color | page |
//! |----------|----------------|-------|------|
//! | advance  | EXTENDED_RANGE | WHITE | 2    |
//! | lunge    | EXTENDED_RANGE | RED   | 4    |
//! | strike   | DOWN_SWING     | RED   | 12   |
//! | leap     | JUMP           | GREEN | 26   |
//!
//! Advancing against advancing closes to normal range; lunging lands for 3 and
//! stays at range; strikes hit for `strike_damage`; leaping pulls only the
//! leaper's page back to extended range.

use std::sync::Arc;

use crate::book::{Book, LookupPage, PicturePage};
use crate::character::Character;
use crate::effect::Effect;
use crate::maneuver::{Category, Color, Maneuver};
use crate::restriction::Restriction;

pub const STANDOFF: u32 = 1;
pub const CLOSING: u32 = 101;
pub const LUNGE_LANDS: u32 = 102;
pub const STRUCK: u32 = 103;
pub const LEAPING: u32 = 104;
pub const TRADING: u32 = 105;

pub fn maneuvers(strike_modifier: i32) -> Vec<Maneuver> {
    vec![
        Maneuver::new("advance", "Advance", Category::ExtendedRange, Color::White, 2)
            .with_extended_page(2),
        Maneuver::new("lunge", "Lunge", Category::ExtendedRange, Color::Red, 4)
            .with_extended_page(4),
        Maneuver::new("strike", "Strike", Category::DownSwing, Color::Red, 12)
            .with_modifier(strike_modifier),
        Maneuver::new("leap", "Leap Away", Category::Jump, Color::Green, 26),
    ]
}

pub fn book(strike_damage: i32) -> Book {
    let pictures = [
        PicturePage::new(STANDOFF, "Standoff", true).with_effect(Effect::OnlyExtendedRange),
        PicturePage::new(CLOSING, "Closing", false).with_effect(Effect::NoExtendedRange),
        PicturePage::new(LUNGE_LANDS, "Lunge lands", true)
            .with_damage(3)
            .with_effect(Effect::OnlyExtendedRange),
        PicturePage::new(STRUCK, "Struck home", false)
            .with_damage(strike_damage)
            .with_restriction(Restriction::no_color([Color::Red]))
            .with_effect(Effect::NoExtendedRange),
        PicturePage::new(LEAPING, "Leaping clear", true)
            .with_effect(Effect::SetRange { extended: true })
            .with_effect(Effect::OnlyExtendedRange),
        PicturePage::new(TRADING, "Trading blows", false)
            .with_damage(strike_damage)
            .with_effect(Effect::NoExtendedRange),
    ];

    let lookups = [
        LookupPage::new(2).with_entry(2, CLOSING).with_entry(4, STANDOFF),
        LookupPage::new(4)
            .with_entry(2, LUNGE_LANDS)
            .with_entry(4, LUNGE_LANDS),
        LookupPage::new(12)
            .with_entry(12, TRADING)
            .with_entry(26, CLOSING),
        LookupPage::new(26)
            .with_entry(12, LEAPING)
            .with_entry(26, LEAPING),
    ];

    Book::new(pictures, lookups)
}

pub fn character(id: &str, height: i32, body_points: i32, strike_damage: i32) -> Arc<Character> {
    Character::new(id, id, height, body_points, maneuvers(0), book(strike_damage)).into_shared()
}

pub fn maneuver(character: &Character, id: &str) -> Maneuver {
    character
        .maneuver(id)
        .cloned()
        .unwrap_or_else(|| panic!("fixture maneuver {id} missing"))
}
