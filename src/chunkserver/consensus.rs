//! Consensus boundary
//!
//! The concrete consensus engine (leader election, log replication,
//! snapshotting) is an external collaborator. Chunkserver code talks to it
//! only through [`ConsensusLog`]: submit a serialized command and await its
//! committed outcome, request a read-index confirmation, and observe
//! leadership.
//!
//! [`LocalNode`] is a single-replica implementation of that contract used
//! by tests and single-node deployments: every submitted command commits
//! immediately and is applied to the chunk store in log order.

use crate::chunkserver::operation::{Operation, OperationOutput};
use crate::chunkserver::store::ChunkStore;
use crate::common::{Error, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Consensus role as observed by the chunkserver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Follower,
    Candidate,
    Leader,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Follower => write!(f, "follower"),
            Role::Candidate => write!(f, "candidate"),
            Role::Leader => write!(f, "leader"),
        }
    }
}

/// A committed and applied command.
#[derive(Debug)]
pub struct Applied {
    /// Log index the command committed at
    pub index: u64,
    /// State machine output
    pub output: OperationOutput,
}

/// Contract the external consensus engine provides to the chunkserver.
///
/// Completion is delivered through oneshot channels rather than callbacks,
/// so the engine's internal threads are never blocked by request-handling
/// work on the receiving side.
pub trait ConsensusLog: Send + Sync {
    /// Is this node the current leader?
    fn is_leader(&self) -> bool;

    /// Address of the current known leader, for redirect hints.
    fn leader_hint(&self) -> Option<String>;

    /// Submit a serialized command. The receiver resolves once the command
    /// has committed and been applied, or with the reason it could not be.
    fn submit(&self, command: Vec<u8>) -> oneshot::Receiver<Result<Applied>>;

    /// Request a read-index confirmation. Resolves `true` when a local read
    /// is guaranteed to observe every previously committed write.
    fn read_index(&self) -> oneshot::Receiver<bool>;
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub term: u64,
    pub index: u64,
    pub data: Vec<u8>,
}

/// Single-replica consensus stand-in.
pub struct LocalNode {
    node_id: String,
    advertise_addr: String,
    role: Arc<Mutex<Role>>,
    term: Arc<Mutex<u64>>,
    leader_hint: Arc<Mutex<Option<String>>>,
    log: Arc<Mutex<Vec<LogEntry>>>,
    store: Arc<Mutex<ChunkStore>>,
}

impl LocalNode {
    pub fn new(node_id: String, advertise_addr: String, store: Arc<Mutex<ChunkStore>>) -> Self {
        Self {
            node_id,
            advertise_addr,
            role: Arc::new(Mutex::new(Role::Follower)),
            term: Arc::new(Mutex::new(0)),
            leader_hint: Arc::new(Mutex::new(None)),
            log: Arc::new(Mutex::new(Vec::new())),
            store,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn role(&self) -> Role {
        *self.role.lock().unwrap()
    }

    pub fn term(&self) -> u64 {
        *self.term.lock().unwrap()
    }

    /// Assume leadership (single-node deployments and tests).
    pub fn become_leader(&self) {
        *self.role.lock().unwrap() = Role::Leader;
        *self.leader_hint.lock().unwrap() = Some(self.advertise_addr.clone());
        *self.term.lock().unwrap() += 1;
        tracing::info!(node = %self.node_id, term = self.term(), "became leader");
    }

    /// Step down to follower, pointing redirects at `leader_addr`.
    pub fn step_down(&self, leader_addr: Option<String>) {
        *self.role.lock().unwrap() = Role::Follower;
        *self.leader_hint.lock().unwrap() = leader_addr;
    }

    pub fn log_len(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

impl ConsensusLog for LocalNode {
    fn is_leader(&self) -> bool {
        matches!(*self.role.lock().unwrap(), Role::Leader)
    }

    fn leader_hint(&self) -> Option<String> {
        self.leader_hint.lock().unwrap().clone()
    }

    fn submit(&self, command: Vec<u8>) -> oneshot::Receiver<Result<Applied>> {
        let (tx, rx) = oneshot::channel();

        if !self.is_leader() {
            let hint = self
                .leader_hint()
                .unwrap_or_else(|| "unknown".to_string());
            let _ = tx.send(Err(Error::NotLeader(hint)));
            return rx;
        }

        let result = (|| {
            let op = Operation::decode(&command)?;
            let mut log = self.log.lock().unwrap();
            let index = log.len() as u64 + 1;
            log.push(LogEntry {
                term: self.term(),
                index,
                data: command,
            });
            // Single replica: committed as soon as it is appended.
            let output = self.store.lock().unwrap().apply(op, index)?;
            Ok(Applied { index, output })
        })();

        let _ = tx.send(result);
        rx
    }

    fn read_index(&self) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        // A single replica can confirm a read only while it is leader.
        let _ = tx.send(self.is_leader());
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn node(dir: &std::path::Path) -> LocalNode {
        let store = Arc::new(Mutex::new(ChunkStore::open(dir).unwrap()));
        LocalNode::new("cs-1".into(), "127.0.0.1:7001".into(), store)
    }

    #[tokio::test]
    async fn test_follower_rejects_submit() {
        let dir = tempdir().unwrap();
        let n = node(dir.path());
        n.step_down(Some("127.0.0.1:7002".into()));

        let cmd = Operation::IncrementAndGet { delta: 1 }.encode().unwrap();
        let err = n.submit(cmd).await.unwrap().unwrap_err();
        assert_eq!(err.redirect(), Some("127.0.0.1:7002"));
        assert_eq!(n.log_len(), 0);
    }

    #[tokio::test]
    async fn test_leader_applies_in_log_order() {
        let dir = tempdir().unwrap();
        let n = node(dir.path());
        n.become_leader();

        for expected in 1..=3i64 {
            let cmd = Operation::IncrementAndGet { delta: 1 }.encode().unwrap();
            let applied = n.submit(cmd).await.unwrap().unwrap();
            assert_eq!(applied.index, expected as u64);
            assert_eq!(applied.output.value(), Some(expected));
        }
        assert_eq!(n.log_len(), 3);
    }

    #[tokio::test]
    async fn test_read_index_tracks_leadership() {
        let dir = tempdir().unwrap();
        let n = node(dir.path());
        assert!(!n.read_index().await.unwrap());
        n.become_leader();
        assert!(n.read_index().await.unwrap());
    }
}
