//! High-score table.
//!
//! A fixed-length list, best first. A new score takes the first slot it beats and pushes
//! the lowest entry off the end. Persisted as JSON next to the game, or not at all when no
//! path is configured.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::config::{GameConfig, HighScoreSection};
use crate::common::error::{ConfigError, SaveError};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct HighScoreTable {
    pub scores: Vec<u32>,
}

impl HighScoreTable {
    /// `count` empty slots.
    pub fn new(count: usize) -> Self {
        Self {
            scores: vec![0; count],
        }
    }

    /// Pad or cut to exactly `count` entries, keeping the best first.
    pub fn fit(mut self, count: usize) -> Self {
        self.scores.sort_unstable_by(|a, b| b.cmp(a));
        self.scores.resize(count, 0);
        self
    }

    /// Rank `score`. Returns the slot it landed in, `None` if it beat nothing.
    pub fn insert(&mut self, score: u32) -> Option<usize> {
        let rank = self.scores.iter().position(|&entry| score > entry)?;
        self.scores.insert(rank, score);
        self.scores.pop();
        Some(rank)
    }

    pub fn best(&self) -> u32 {
        self.scores.first().copied().unwrap_or_default()
    }

    /// Read a saved table. A missing file is an empty table.
    pub fn load(path: &Path, count: usize) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::new(count)),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let table: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(table.fit(count))
    }

    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        let text = serde_json::to_string_pretty(self)?;
        let write = |source: std::io::Error| SaveError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(write)?;
        }
        std::fs::write(path, text).map_err(write)
    }
}

/// The table plus where it lives.
#[derive(Resource, Debug, Clone)]
pub struct HighScores {
    pub table: HighScoreTable,
    pub path: Option<PathBuf>,
}

impl HighScores {
    /// Load from the configured path. Unreadable files are logged and start a fresh table.
    pub fn from_config(section: &HighScoreSection) -> Self {
        let count = section.high_score_count;
        let path = (!section.path.is_empty()).then(|| PathBuf::from(&section.path));
        let table = match &path {
            Some(path) => HighScoreTable::load(path, count).unwrap_or_else(|err| {
                warn!("{err}, starting a fresh high-score table");
                HighScoreTable::new(count)
            }),
            None => HighScoreTable::new(count),
        };
        Self { table, path }
    }

    /// Rank `score` and write the table back when it changed.
    pub fn submit(&mut self, score: u32) -> Option<usize> {
        let rank = self.table.insert(score)?;
        info!("new high score {score} at rank {}", rank + 1);
        if let Some(path) = &self.path {
            if let Err(err) = self.table.save(path) {
                warn!("could not save high scores: {err}");
            }
        }
        Some(rank)
    }
}

impl FromWorld for HighScores {
    fn from_world(world: &mut World) -> Self {
        let section = world
            .get_resource::<GameConfig>()
            .map(|config| config.high_scores.clone())
            .unwrap_or_default();
        Self::from_config(&section)
    }
}
