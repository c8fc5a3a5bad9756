//! Master coordinator
//!
//! Cluster control plane: receives heartbeats, runs the background
//! failure detector, and registers file versions acknowledged by clients.
//! All state lives on this explicitly constructed object; independent
//! masters can coexist in one process (tests rely on this).

use crate::codec::CodecParams;
use crate::common::{MasterConfig, Result};
use crate::master::index::{NewVersion, VersionIndex};
use crate::master::liveness::{start_monitor, LivenessTable, RecoveryHandler};
use std::sync::{Arc, Mutex};

/// Heartbeat RPC response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatAck {
    pub received: bool,
}

/// WriteSuccess RPC response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    pub success: bool,
    pub version: u64,
}

pub struct Master {
    config: MasterConfig,
    liveness: Arc<LivenessTable>,
    index: Arc<Mutex<VersionIndex>>,
    recovery: Arc<dyn RecoveryHandler>,
}

impl Master {
    /// Construct a master, reloading the persisted version index before
    /// anything is served.
    pub fn open(
        config: MasterConfig,
        codec: CodecParams,
        recovery: Arc<dyn RecoveryHandler>,
    ) -> Result<Self> {
        let index = VersionIndex::open(&config.index_path, codec.block_size)?;
        let liveness = Arc::new(LivenessTable::new(config.expected_chunkservers.clone()));

        tracing::info!(
            index_path = %config.index_path.display(),
            check_interval_ms = config.check_interval_ms,
            expected = config.expected_chunkservers.len(),
            "master ready"
        );

        Ok(Self {
            config,
            liveness,
            index: Arc::new(Mutex::new(index)),
            recovery,
        })
    }

    /// Handle a chunkserver heartbeat.
    pub fn heartbeat(&self, server_tag: &str) -> HeartbeatAck {
        tracing::debug!(server = server_tag, at = %chrono::Utc::now(), "received heartbeat");
        self.liveness.record(server_tag);
        HeartbeatAck { received: true }
    }

    /// Handle a client's acknowledgment of a completed write by
    /// registering the new file version.
    pub fn write_success(
        &self,
        file_name: &str,
        file_size: u64,
        append_at: u64,
        write_flag: &str,
    ) -> Result<WriteAck> {
        let NewVersion { version, .. } = self.index.lock().unwrap().add_file_version(
            file_name, file_size, append_at, write_flag,
        )?;
        Ok(WriteAck {
            success: true,
            version,
        })
    }

    /// Spawn the heartbeat monitor for the lifetime of this master.
    pub fn start_monitor(&self) -> tokio::task::JoinHandle<()> {
        start_monitor(
            self.liveness.clone(),
            self.config.check_interval(),
            self.recovery.clone(),
        )
    }

    pub fn liveness(&self) -> &Arc<LivenessTable> {
        &self.liveness
    }

    pub fn index(&self) -> &Arc<Mutex<VersionIndex>> {
        &self.index
    }
}
