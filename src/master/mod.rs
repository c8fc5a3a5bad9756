//! Master coordinator
//!
//! The cluster control plane:
//! - Heartbeat-driven failure detection ([`liveness`])
//! - Recovery triggering via an external [`RecoveryHandler`]
//! - The durable versioned file → chunk-list index ([`index`])

pub mod index;
pub mod liveness;
pub mod server;

pub use index::{NewVersion, VersionIndex};
pub use liveness::{LivenessTable, LogOnlyRecovery, Presence, RecoveryHandler, Sweep};
pub use server::{HeartbeatAck, Master, WriteAck};
