//! Per-character lookup tables.
//!
//! A [`Book`] pairs the character's picture pages (outcomes) with its lookup
//! pages (opponent page → result page). Both tables are ordered maps so that
//! every traversal, including the fallback search, is deterministic.

use std::collections::BTreeMap;

use crate::effect::Effect;
use crate::restriction::Restriction;

/// Page numbers as printed in the book.
pub type PageNumber = u32;

/// A named outcome shown as the result of an exchange.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PicturePage {
    pub page_number: PageNumber,
    pub title: String,
    pub is_extended_range: bool,
    /// Damage this outcome inflicts on the opponent; `None` reads "no damage".
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub restriction: Restriction,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<Effect>,
    /// Display metadata, opaque to the engine.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub illustration: Option<String>,
}

impl PicturePage {
    pub fn new(page_number: PageNumber, title: impl Into<String>, is_extended_range: bool) -> Self {
        Self {
            page_number,
            title: title.into(),
            is_extended_range,
            damage: None,
            restriction: Restriction::None,
            effects: Vec::new(),
            illustration: None,
        }
    }

    /// Placeholder used when a book holds no picture pages at all.
    pub fn blank() -> Self {
        Self::new(0, "No result", true)
    }

    #[must_use]
    pub fn with_damage(mut self, damage: i32) -> Self {
        self.damage = Some(damage);
        self
    }

    #[must_use]
    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = restriction;
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn damage_or_zero(&self) -> i32 {
        self.damage.unwrap_or(0)
    }
}

/// A cross-reference table: opponent's page → one of the owner's picture pages.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct LookupPage {
    pub page_number: PageNumber,
    pub mapping: BTreeMap<PageNumber, PageNumber>,
}

impl LookupPage {
    pub fn new(page_number: PageNumber) -> Self {
        Self {
            page_number,
            mapping: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, opponent_page: PageNumber, result_page: PageNumber) -> Self {
        self.mapping.insert(opponent_page, result_page);
        self
    }

    /// Result page for `opponent_page`; zero entries count as missing.
    pub fn result_for(&self, opponent_page: PageNumber) -> Option<PageNumber> {
        self.mapping
            .get(&opponent_page)
            .copied()
            .filter(|page| *page != 0)
    }
}

/// Both tables of one character, keyed by page number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Book {
    pictures: BTreeMap<PageNumber, PicturePage>,
    lookups: BTreeMap<PageNumber, LookupPage>,
}

impl Book {
    /// Page shown when a lookup cannot be completed.
    pub const FALLBACK_PAGE: PageNumber = 1;

    pub fn new(
        pictures: impl IntoIterator<Item = PicturePage>,
        lookups: impl IntoIterator<Item = LookupPage>,
    ) -> Self {
        Self {
            pictures: pictures
                .into_iter()
                .map(|page| (page.page_number, page))
                .collect(),
            lookups: lookups
                .into_iter()
                .map(|page| (page.page_number, page))
                .collect(),
        }
    }

    pub fn picture(&self, page: PageNumber) -> Option<&PicturePage> {
        self.pictures.get(&page)
    }

    pub fn lookup(&self, page: PageNumber) -> Option<&LookupPage> {
        self.lookups.get(&page)
    }

    pub fn pictures(&self) -> impl Iterator<Item = &PicturePage> {
        self.pictures.values()
    }

    pub fn lookups(&self) -> impl Iterator<Item = &LookupPage> {
        self.lookups.values()
    }

    /// Page 1, else the lowest-numbered picture page.
    pub fn fallback_picture(&self) -> Option<&PicturePage> {
        self.picture(Self::FALLBACK_PAGE)
            .or_else(|| self.pictures.values().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_mapping_entries_are_missing() {
        let page = LookupPage::new(12).with_entry(14, 101).with_entry(16, 0);
        assert_eq!(page.result_for(14), Some(101));
        assert_eq!(page.result_for(16), None);
        assert_eq!(page.result_for(18), None);
    }

    #[test]
    fn fallback_prefers_page_one() {
        let book = Book::new(
            [
                PicturePage::new(7, "Seven", false),
                PicturePage::new(1, "Standoff", true),
            ],
            [],
        );
        assert_eq!(book.fallback_picture().map(|p| p.page_number), Some(1));

        let book = Book::new(
            [
                PicturePage::new(9, "Nine", false),
                PicturePage::new(4, "Four", false),
            ],
            [],
        );
        assert_eq!(book.fallback_picture().map(|p| p.page_number), Some(4));
        assert!(Book::default().fallback_picture().is_none());
    }
}
