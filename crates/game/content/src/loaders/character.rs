//! Character book loader.
//!
//! A character file is one JSON document:
//!
//! ```json
//! {
//!   "id": "knight",
//!   "name": "Sir Aldric the Knight",
//!   "height": 5,
//!   "maxBodyPoints": 14,
//!   "maneuvers": [{ "id": "smash", "category": "DOWN_SWING", "color": "RED", "normalPage": 12, ... }],
//!   "picturePages": [{ "pageNumber": 1, "title": "Standoff", "isExtendedRange": true, ... }],
//!   "lookupPages": [{ "pageNumber": 12, "mapping": { "2": 101, "4": 102 } }]
//! }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use game_core::{Book, Character, LookupPage, Maneuver, PicturePage};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadError, LoadResult, read_file};

/// On-disk shape of a character. Pages are lists here and keyed maps in
/// [`Book`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub height: i32,
    pub max_body_points: i32,
    pub maneuvers: Vec<Maneuver>,
    pub picture_pages: Vec<PicturePage>,
    pub lookup_pages: Vec<LookupPage>,
}

impl CharacterDefinition {
    /// Checks uniqueness rules that serde cannot express, then builds the
    /// immutable [`Character`].
    pub fn into_character(self) -> Result<Character, LoadError> {
        if self.max_body_points <= 0 {
            return Err(LoadError::InvalidBodyPoints {
                character: self.id,
                value: self.max_body_points,
            });
        }

        let mut seen = BTreeSet::new();
        for maneuver in &self.maneuvers {
            if !seen.insert(maneuver.id.as_str()) {
                return Err(LoadError::DuplicateManeuver {
                    character: self.id.clone(),
                    maneuver: maneuver.id.clone(),
                });
            }
        }

        ensure_unique(&self.id, "picture", self.picture_pages.iter().map(|p| p.page_number))?;
        ensure_unique(&self.id, "lookup", self.lookup_pages.iter().map(|p| p.page_number))?;

        let book = Book::new(self.picture_pages, self.lookup_pages);
        Ok(Character::new(
            self.id,
            self.name,
            self.height,
            self.max_body_points,
            self.maneuvers,
            book,
        ))
    }
}

fn ensure_unique(
    character: &str,
    kind: &'static str,
    pages: impl Iterator<Item = u32>,
) -> Result<(), LoadError> {
    let mut seen = BTreeSet::new();
    for page in pages {
        if !seen.insert(page) {
            return Err(LoadError::DuplicatePage {
                character: character.to_owned(),
                kind,
                page,
            });
        }
    }
    Ok(())
}

/// Loader for character JSON files.
pub struct CharacterLoader;

impl CharacterLoader {
    /// Load a character from a JSON file.
    pub fn load(path: &Path) -> LoadResult<Character> {
        let content = read_file(path)?;
        Self::from_json(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load character {}: {:#}", path.display(), e))
    }

    /// Parse a character from JSON text.
    pub fn from_json(content: &str) -> LoadResult<Character> {
        let definition: CharacterDefinition = serde_json::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse character JSON: {}", e))?;
        Ok(definition.into_character()?)
    }
}
