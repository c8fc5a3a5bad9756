//! Chunkserver service
//!
//! Client-facing operation dispatcher: validates leadership, serializes
//! operations into the consensus log, and resolves committed results back
//! to callers as typed `Result`s.

use crate::chunkserver::consensus::{Applied, ConsensusLog};
use crate::chunkserver::operation::{ChunkMetadata, Operation};
use crate::chunkserver::store::ChunkStore;
use crate::common::{Error, Result};
use std::sync::{Arc, Mutex};

pub struct ChunkserverService {
    node: Arc<dyn ConsensusLog>,
    store: Arc<Mutex<ChunkStore>>,
}

impl ChunkserverService {
    pub fn new(node: Arc<dyn ConsensusLog>, store: Arc<Mutex<ChunkStore>>) -> Self {
        Self { node, store }
    }

    /// Read the counter.
    ///
    /// Fast path (`read_only_safe = false`): the local value, immediately.
    /// May be stale if this node is not the leader or lags the log.
    ///
    /// Linearizable path (`read_only_safe = true`): ask the consensus
    /// engine for a read-index confirmation; once confirmed, the local
    /// value is guaranteed current. If confirmation fails the read falls
    /// back to an explicit `Get` through the log, re-checking leadership
    /// first so a non-leader returns a redirect instead of a stale value.
    pub async fn get(&self, read_only_safe: bool) -> Result<i64> {
        if !read_only_safe {
            return Ok(self.local_value());
        }

        if self.node.read_index().await.unwrap_or(false) {
            return Ok(self.local_value());
        }

        tracing::debug!("read-index confirmation failed, applying Get through the log");
        if !self.node.is_leader() {
            return Err(self.not_leader());
        }
        let applied = self.apply_operation(Operation::Get).await?;
        applied
            .output
            .value()
            .ok_or_else(|| Error::Internal("Get returned no value".into()))
    }

    /// Add `delta` to the counter through the log.
    pub async fn increment_and_get(&self, delta: i64) -> Result<i64> {
        let applied = self
            .apply_operation(Operation::IncrementAndGet { delta })
            .await?;
        applied
            .output
            .value()
            .ok_or_else(|| Error::Internal("IncrementAndGet returned no value".into()))
    }

    /// Replace the bytes register through the log.
    pub async fn set_bytes_value(&self, value: Vec<u8>) -> Result<u64> {
        let applied = self.apply_operation(Operation::SetBytesValue { value }).await?;
        Ok(applied.index)
    }

    /// Durably write shard payloads as named chunk objects.
    ///
    /// Leader-only: a non-leader rejects with a redirect hint without
    /// touching the log. Resolves with the commit log index.
    pub async fn write(&self, shards: Vec<Vec<u8>>, metadata: ChunkMetadata) -> Result<u64> {
        let applied = self
            .apply_operation(Operation::Write { shards, metadata })
            .await?;
        Ok(applied.index)
    }

    /// Read this node's persisted chunk payloads. Local disk only.
    pub fn read(&self) -> Result<Vec<u8>> {
        self.store.lock().unwrap().read_disk()
    }

    async fn apply_operation(&self, op: Operation) -> Result<Applied> {
        if !self.node.is_leader() {
            return Err(self.not_leader());
        }

        // A command that cannot be encoded is aborted here, never submitted.
        let command = op.encode()?;

        self.node
            .submit(command)
            .await
            .map_err(|_| Error::Consensus("commit notification dropped".into()))?
    }

    fn local_value(&self) -> i64 {
        self.store.lock().unwrap().value()
    }

    fn not_leader(&self) -> Error {
        Error::NotLeader(
            self.node
                .leader_hint()
                .unwrap_or_else(|| "unknown".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunkserver::consensus::LocalNode;
    use tempfile::tempdir;

    fn service(dir: &std::path::Path) -> (Arc<LocalNode>, ChunkserverService) {
        let store = Arc::new(Mutex::new(ChunkStore::open(dir).unwrap()));
        let node = Arc::new(LocalNode::new(
            "cs-1".into(),
            "127.0.0.1:7001".into(),
            store.clone(),
        ));
        let svc = ChunkserverService::new(node.clone(), store);
        (node, svc)
    }

    fn metadata(names: &[&str]) -> ChunkMetadata {
        ChunkMetadata {
            file_name: "a.txt".into(),
            version: 1,
            chunk_names: names.iter().map(|s| s.to_string()).collect(),
            file_hash: String::new(),
        }
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let (node, svc) = service(dir.path());
        node.become_leader();

        let index = svc
            .write(
                vec![vec![1, 2], vec![3, 4]],
                metadata(&["a.txt.1.0", "a.txt.1.1"]),
            )
            .await
            .unwrap();
        assert_eq!(index, 1);
        assert_eq!(svc.read().unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_non_leader_write_redirects() {
        let dir = tempdir().unwrap();
        let (node, svc) = service(dir.path());
        node.step_down(Some("127.0.0.1:7009".into()));

        let err = svc
            .write(vec![vec![1]], metadata(&["a.txt.1.0"]))
            .await
            .unwrap_err();
        assert_eq!(err.redirect(), Some("127.0.0.1:7009"));
        assert_eq!(node.log_len(), 0);
    }

    #[tokio::test]
    async fn test_fast_read_works_on_follower() {
        let dir = tempdir().unwrap();
        let (_node, svc) = service(dir.path());
        // Relaxed read never consults the log.
        assert_eq!(svc.get(false).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_safe_read_redirects_on_follower() {
        let dir = tempdir().unwrap();
        let (node, svc) = service(dir.path());
        node.step_down(Some("127.0.0.1:7009".into()));

        let err = svc.get(true).await.unwrap_err();
        assert_eq!(err.redirect(), Some("127.0.0.1:7009"));
    }

    #[tokio::test]
    async fn test_safe_read_after_write_observes_write() {
        let dir = tempdir().unwrap();
        let (node, svc) = service(dir.path());
        node.become_leader();

        assert_eq!(svc.increment_and_get(7).await.unwrap(), 7);
        assert_eq!(svc.get(true).await.unwrap(), 7);
    }
}
