//! In-memory character roster.

use std::sync::Arc;

use game_core::{Character, CharacterOracle};

/// Ordered set of selectable characters; the runtime's [`CharacterOracle`].
#[derive(Clone, Debug, Default)]
pub struct CharacterRoster {
    characters: Vec<Arc<Character>>,
}

impl CharacterRoster {
    pub fn new(characters: Vec<Arc<Character>>) -> Self {
        Self { characters }
    }

    /// The sample roster compiled into the crate.
    #[cfg(feature = "loaders")]
    pub fn bundled() -> crate::loaders::LoadResult<Self> {
        use crate::loaders::{CharacterLoader, RosterManifest, roster::check_id};

        const MANIFEST: &str = include_str!("../data/roster.toml");
        const FILES: [(&str, &str); 2] = [
            (
                "characters/knight.json",
                include_str!("../data/characters/knight.json"),
            ),
            (
                "characters/goblin.json",
                include_str!("../data/characters/goblin.json"),
            ),
        ];

        let manifest = RosterManifest::from_toml(MANIFEST)?;
        let characters = manifest
            .characters
            .iter()
            .map(|entry| {
                let (_, json) = FILES
                    .iter()
                    .find(|(path, _)| entry.file.as_os_str() == *path)
                    .ok_or_else(|| {
                        anyhow::anyhow!("bundled roster has no file {}", entry.file.display())
                    })?;
                check_id(entry, CharacterLoader::from_json(json)?)
            })
            .collect::<crate::loaders::LoadResult<Vec<_>>>()?;

        Ok(Self::new(characters))
    }

    pub fn characters(&self) -> &[Arc<Character>] {
        &self.characters
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

impl CharacterOracle for CharacterRoster {
    fn character(&self, id: &str) -> Option<Arc<Character>> {
        self.characters.iter().find(|c| c.id == id).cloned()
    }

    fn ids(&self) -> Vec<String> {
        self.characters.iter().map(|c| c.id.clone()).collect()
    }
}
