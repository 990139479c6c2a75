//! Roster manifest loader.
//!
//! TOML format:
//!
//! ```toml
//! [[characters]]
//! id = "knight"
//! file = "characters/knight.json"
//! ```
//!
//! File paths are relative to the manifest's directory.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use game_core::Character;
use serde::{Deserialize, Serialize};

use crate::loaders::{CharacterLoader, LoadError, LoadResult, read_file};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub file: PathBuf,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterManifest {
    #[serde(default)]
    pub characters: Vec<RosterEntry>,
}

impl RosterManifest {
    pub fn from_toml(content: &str) -> LoadResult<Self> {
        let manifest: Self = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse roster TOML: {}", e))?;

        if manifest.characters.is_empty() {
            return Err(LoadError::EmptyRoster.into());
        }
        let mut seen = BTreeSet::new();
        for entry in &manifest.characters {
            if !seen.insert(entry.id.as_str()) {
                return Err(LoadError::DuplicateRosterEntry(entry.id.clone()).into());
            }
        }

        Ok(manifest)
    }
}

/// Loader for a roster directory (`roster.toml` plus character files).
pub struct RosterLoader;

impl RosterLoader {
    pub const MANIFEST: &'static str = "roster.toml";

    /// Load every character listed in `dir/roster.toml`, in manifest order.
    pub fn load_dir(dir: &Path) -> LoadResult<Vec<Arc<Character>>> {
        let manifest_path = dir.join(Self::MANIFEST);
        let manifest = RosterManifest::from_toml(&read_file(&manifest_path)?)
            .map_err(|e| anyhow::anyhow!("{}: {:#}", manifest_path.display(), e))?;

        manifest
            .characters
            .iter()
            .map(|entry| {
                let character = CharacterLoader::load(&dir.join(&entry.file))?;
                check_id(entry, character)
            })
            .collect()
    }
}

pub(crate) fn check_id(entry: &RosterEntry, character: Character) -> LoadResult<Arc<Character>> {
    if character.id != entry.id {
        return Err(LoadError::IdMismatch {
            expected: entry.id.clone(),
            found: character.id,
        }
        .into());
    }
    Ok(character.into_shared())
}
