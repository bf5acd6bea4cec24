use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    eval::EvalConfig,
    play::PlayConfig,
    train::TrainerConfig,
};

pub const DEFAULT_TABLE_PATH: &str = "q_table.json";

/// Top-level configuration, loadable from TOML
///
/// ```toml
/// table_path = "q_table.json"
///
/// [trainer]
/// episodes = 20000
/// opponent = "heuristic"
/// epsilon = { kind = "linear", start = 0.3, end = 0.01 }
///
/// [eval]
/// games = 1000
/// opponents = ["random", "heuristic", "center-first"]
///
/// [play]
/// ai_delay_ms = 500
/// human_first = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub table_path: PathBuf,
    pub trainer: TrainerConfig,
    pub eval: EvalConfig,
    pub play: PlayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            table_path: PathBuf::from(DEFAULT_TABLE_PATH),
            trainer: TrainerConfig::default(),
            eval: EvalConfig::default(),
            play: PlayConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io("read", path, e))?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_path.as_os_str().is_empty() {
            return Err(Error::config("table_path must not be empty"));
        }
        self.trainer.validate()?;
        self.eval.validate()
    }
}
