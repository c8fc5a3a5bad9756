//! Common utilities and types shared across shardfs

pub mod config;
pub mod error;
pub mod utils;

pub use config::{ChunkserverConfig, Config, MasterConfig, NodeRole};
pub use error::{Error, Result};
pub use utils::{blake3_hex, crc32, format_bytes, timestamp_now_millis};
