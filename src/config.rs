//! Application configuration management.
//!
//! The config remembers the last login username so reruns can prefill the
//! prompt. Everything secret lives in the data directory instead: the key
//! file, the encrypted cookie jar, and the encrypted reports.
//!
//! Configuration is stored at `~/.config/gramscope/config.json`; data at
//! `~/.local/share/gramscope` (or wherever `GRAMSCOPE_DATA_DIR` points).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths.
const APP_NAME: &str = "gramscope";

/// Config file name.
const CONFIG_FILE: &str = "config.json";

/// Environment override for the data directory.
const DATA_DIR_ENV: &str = "GRAMSCOPE_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Where the key file, cookie jar, and reports live.
    pub fn data_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
