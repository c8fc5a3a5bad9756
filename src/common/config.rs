//! Configuration for shardfs components

use crate::codec::CodecParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node ID (unique identifier)
    pub node_id: String,

    /// Role (master or chunkserver)
    pub role: NodeRole,

    /// Erasure-coding geometry shared by every component
    #[serde(default)]
    pub codec: CodecParams,

    /// Master-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master: Option<MasterConfig>,

    /// Chunkserver-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunkserver: Option<ChunkserverConfig>,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Master,
    Chunkserver,
}

/// Master configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Path of the persisted file-version index
    pub index_path: PathBuf,

    /// Heartbeat monitor interval
    #[serde(default = "default_check_interval")]
    pub check_interval_ms: u64,

    /// Chunkserver ids expected to report; seeded into the liveness table
    /// once the first heartbeat activates storage
    #[serde(default)]
    pub expected_chunkservers: Vec<String>,
}

fn default_check_interval() -> u64 {
    7000
}

impl MasterConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./master-data/file-versions"),
            check_interval_ms: default_check_interval(),
            expected_chunkservers: Vec::new(),
        }
    }
}

/// Chunkserver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkserverConfig {
    /// Directory holding persisted chunk files
    pub data_dir: PathBuf,

    /// Address advertised in redirect hints when this node is leader
    #[serde(default)]
    pub advertise_addr: String,
}

impl Default for ChunkserverConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./chunk-data"),
            advertise_addr: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: "node-0".to_string(),
            role: NodeRole::Chunkserver,
            codec: CodecParams::default(),
            master: None,
            chunkserver: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from `shardfs.toml` (if present) with
    /// `SHARDFS_*` environment overrides. Falls back to defaults.
    pub fn load() -> Config {
        let built = config::Config::builder()
            .add_source(config::File::with_name("shardfs").required(false))
            .add_source(config::Environment::with_prefix("SHARDFS").separator("__"))
            .build()
            .and_then(|c| c.try_deserialize());

        match built {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {}", e);
                Config::default()
            }
        }
    }
}
