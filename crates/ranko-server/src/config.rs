//! Server configuration.
//!
//! Resolution order: built-in defaults → TOML file → env vars → CLI
//! flags. The file is parsed with serde defaults, so a partial config
//! only overrides what it names.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankoConfig {
    /// Address to bind to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Number of shard tasks. 0 means one per available CPU core.
    pub shards: usize,
}

impl Default for RankoConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
            shards: 0,
        }
    }
}

impl RankoConfig {
    /// Loads a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file '{}': {e}", path.display()))?;
        toml::from_str(&data)
            .map_err(|e| format!("failed to parse config file '{}': {e}", path.display()))
    }

    /// Serializes the config as TOML, for `--config-template`.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("failed to serialize config: {e}"))
    }

    /// The shard count with 0 resolved to one shard per available core.
    pub fn resolved_shard_count(&self) -> usize {
        if self.shards > 0 {
            self.shards
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}
