//! Saved games: the initial state, hole and move log of a played or solved
//! game, stored as JSON so it can be replayed later.

use anyhow::{Context, Result};
use compress_core::{Action, Engine, Layer, Symbol};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File name inside a game directory
pub const RECORD_FILE: &str = "record.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub initial_state: Vec<Symbol>,
    pub hole: Option<usize>,
    pub moves: Vec<Action>,
    pub layers: Vec<Layer>,
    pub final_cost: usize,
    /// Unix timestamp when the record was made
    pub timestamp: u64,
}

impl GameRecord {
    pub fn from_engine(engine: &Engine) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            initial_state: engine.root().to_vec(),
            hole: engine.hole(),
            moves: engine.moves().to_vec(),
            layers: engine.layers().to_vec(),
            final_cost: engine.cost(),
            timestamp,
        }
    }

    /// Write into a fresh `game_<timestamp>` directory under `base`.
    /// Returns the game directory.
    pub fn save(&self, base: &Path) -> Result<PathBuf> {
        let mut dir = base.join(format!("game_{}", self.timestamp));
        let mut suffix = 1;
        while dir.exists() {
            dir = base.join(format!("game_{}_{}", self.timestamp, suffix));
            suffix += 1;
        }
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(RECORD_FILE), json)
            .with_context(|| format!("failed to write record into {}", dir.display()))?;
        Ok(dir)
    }

    /// Load from a game directory or directly from a record file
    pub fn load(path: &Path) -> Result<Self> {
        let file = if path.is_dir() {
            path.join(RECORD_FILE)
        } else {
            path.to_path_buf()
        };
        let json = fs::read_to_string(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        serde_json::from_str(&json).with_context(|| format!("malformed record {}", file.display()))
    }

    /// Fresh engine for the recorded initial state
    pub fn engine(&self) -> Result<Engine> {
        Ok(Engine::new(&self.initial_state, self.hole)?)
    }
}

/// Where records go unless `--out` says otherwise
pub fn default_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("compress")
        .join("gameplays")
}
