//! Failure detection and shard recovery.

use shardfs::client::{restore, FileEncoder};
use shardfs::common::MasterConfig;
use shardfs::master::{Master, RecoveryHandler};
use shardfs::CodecParams;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Records every presence vector the monitor hands it.
struct CountingRecovery {
    calls: Mutex<Vec<HashMap<String, bool>>>,
}

impl CountingRecovery {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<HashMap<String, bool>> {
        self.calls.lock().unwrap().clone()
    }
}

impl RecoveryHandler for CountingRecovery {
    fn recover(&self, presence: &HashMap<String, bool>) {
        self.calls.lock().unwrap().push(presence.clone());
    }
}

#[tokio::test]
async fn test_silent_chunkserver_triggers_recovery() {
    let dir = TempDir::new().unwrap();
    let recovery = CountingRecovery::new();

    let master = Master::open(
        MasterConfig {
            index_path: dir.path().join("file-versions"),
            check_interval_ms: 20,
            expected_chunkservers: vec!["0".into(), "1".into()],
        },
        CodecParams::default(),
        recovery.clone(),
    )
    .unwrap();

    // Only chunkserver 0 ever reports.
    master.heartbeat("0");
    let monitor = master.start_monitor();

    tokio::time::sleep(Duration::from_millis(120)).await;
    monitor.abort();

    let calls = recovery.calls();
    assert!(!calls.is_empty(), "monitor never triggered recovery");
    // Every invocation carries the full presence vector with node 1 absent.
    for presence in &calls {
        assert_eq!(presence.get("1"), Some(&false));
        assert!(presence.contains_key("0"));
    }
    // The monitor keeps running after the first recovery: with several
    // cycles elapsed it must have re-detected the absence more than once.
    assert!(calls.len() > 1, "monitor stopped after first recovery");
}

#[tokio::test]
async fn test_returning_heartbeat_restores_presence() {
    let dir = TempDir::new().unwrap();
    let recovery = CountingRecovery::new();

    let master = Master::open(
        MasterConfig {
            index_path: dir.path().join("file-versions"),
            check_interval_ms: 20,
            expected_chunkservers: vec!["0".into()],
        },
        CodecParams::default(),
        recovery.clone(),
    )
    .unwrap();

    master.heartbeat("0");
    let monitor = master.start_monitor();

    // Let node 0 go absent, then keep heartbeating and watch it come back.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(recovery.calls().iter().any(|p| p.get("0") == Some(&false)));

    // Heartbeat faster than the sweep interval so every sweep sees an
    // advanced timestamp.
    for _ in 0..20 {
        master.heartbeat("0");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    monitor.abort();

    assert!(
        matches!(
            master.liveness().presence("0"),
            shardfs::master::Presence::Present
        ),
        "node 0 never returned to present"
    );
}

#[test]
fn test_lost_shards_reconstructed_from_survivors() {
    let dir = TempDir::new().unwrap();
    let params = CodecParams::default();

    let data: Vec<u8> = (0..=255u8).cycle().take(1234).collect();
    let encoder = FileEncoder::from_bytes(PathBuf::from("big.bin"), data.clone(), params).unwrap();

    let disks: Vec<PathBuf> = (0..params.total_shards())
        .map(|i| dir.path().join(format!("disk-{}", i)))
        .collect();
    encoder.store(&disks).unwrap();

    // Two chunkservers go dark; their shards are gone.
    std::fs::remove_file(&disks[0]).unwrap();
    std::fs::remove_file(&disks[5]).unwrap();

    let restored = restore(&disks, data.len() as u64, params).unwrap();
    assert_eq!(restored, data);
}
