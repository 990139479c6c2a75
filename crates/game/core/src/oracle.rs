//! Read-only character lookup.
//!
//! Sessions resolve character ids chosen by players through a
//! [`CharacterOracle`]. The content crate supplies the file-backed roster;
//! tests can supply an in-memory one.

use std::sync::Arc;

use crate::character::Character;

pub trait CharacterOracle: Send + Sync {
    /// Returns the character with `id`, if the roster has one.
    fn character(&self, id: &str) -> Option<Arc<Character>>;

    /// Returns every selectable character id, in roster order.
    fn ids(&self) -> Vec<String>;
}

impl<T: CharacterOracle + ?Sized> CharacterOracle for Arc<T> {
    fn character(&self, id: &str) -> Option<Arc<Character>> {
        (**self).character(id)
    }

    fn ids(&self) -> Vec<String> {
        (**self).ids()
    }
}

/// Oracle over a fixed list of characters.
#[derive(Clone, Debug, Default)]
pub struct StaticOracle {
    characters: Vec<Arc<Character>>,
}

impl StaticOracle {
    pub fn new(characters: impl IntoIterator<Item = Arc<Character>>) -> Self {
        Self {
            characters: characters.into_iter().collect(),
        }
    }
}

impl CharacterOracle for StaticOracle {
    fn character(&self, id: &str) -> Option<Arc<Character>> {
        self.characters.iter().find(|c| c.id == id).cloned()
    }

    fn ids(&self) -> Vec<String> {
        self.characters.iter().map(|c| c.id.clone()).collect()
    }
}
