//! Content factory for building the roster from a data directory.

use std::path::{Path, PathBuf};

use game_core::GameConfig;

use crate::loaders::{ConfigLoader, LoadResult, RosterLoader};
use crate::roster::CharacterRoster;

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml      (optional)
/// ├── roster.toml
/// └── characters/
///     ├── knight.json
///     └── goblin.json
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load game configuration from `config.toml`, or defaults when absent.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        let path = self.data_dir.join("config.toml");
        if path.exists() {
            ConfigLoader::load(&path)
        } else {
            Ok(GameConfig::default())
        }
    }

    /// Load the roster listed in `roster.toml`.
    pub fn load_roster(&self) -> LoadResult<CharacterRoster> {
        Ok(CharacterRoster::new(RosterLoader::load_dir(&self.data_dir)?))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
