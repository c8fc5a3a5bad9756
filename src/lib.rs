//! # shardfs
//!
//! A distributed, erasure-coded file store:
//! - Files are split into fixed-size blocks and interleaved across data shards
//! - Reed–Solomon parity shards tolerate the loss of any `parity_shards` nodes
//! - Each chunkserver is a consensus-replicated state machine with
//!   linearizable and relaxed read modes
//! - A single master tracks chunkserver liveness via heartbeats, triggers
//!   recovery, and keeps a durable versioned file → chunk-list index
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Master                     │
//! │  - heartbeat monitor (failure detector) │
//! │  - versioned file → chunk index         │
//! │  - recovery trigger                     │
//! └───────────▲─────────────────────────────┘
//!             │ heartbeats / write acks
//!   ┌─────────┴──────────┬──────────────┐
//!   │                    │              │
//! ┌─▼──────────┐   ┌─────▼──────┐   ┌──▼───────────┐
//! │ Chunkserver│   │ Chunkserver│   │ Chunkserver  │
//! │ (shard 0)  │   │ (shard 1)  │   │ ...          │
//! │ + log      │   │ + log      │   │ + log        │
//! └────────────┘   └────────────┘   └──────────────┘
//! ```
//!
//! A client encodes a file with [`client::FileEncoder`], writes each shard
//! to its chunkserver's [`chunkserver::ChunkserverService`], and on success
//! acknowledges the [`master::Master`], which records a new file version.
//! The master's monitor independently watches heartbeats and invokes the
//! recovery routine when a node goes silent; recovery reconstructs lost
//! shards from the survivors via [`codec::RsCodec`].

pub mod chunkserver;
pub mod client;
pub mod codec;
pub mod common;
pub mod master;

// Re-export commonly used types
pub use chunkserver::{ChunkserverService, ChunkStore, ConsensusLog, LocalNode};
pub use codec::{CodecParams, RsCodec};
pub use common::{Config, Error, Result};
pub use master::Master;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
