//! Chunkserver implementation
//!
//! A storage node's logic, layered as:
//! - [`operation`]: serializable commands submitted through the log
//! - [`store`]: the state machine applying committed commands
//! - [`consensus`]: the boundary to the external consensus engine
//! - [`service`]: the leadership-aware client-facing dispatcher

pub mod consensus;
pub mod operation;
pub mod service;
pub mod store;

pub use consensus::{Applied, ConsensusLog, LocalNode, Role};
pub use operation::{ChunkMetadata, Operation, OperationOutput};
pub use service::ChunkserverService;
pub use store::ChunkStore;
