//! Leadership failover on the chunkserver write path.

use shardfs::chunkserver::{ChunkMetadata, ChunkStore, ChunkserverService, LocalNode};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn chunkserver(
    dir: &std::path::Path,
    id: &str,
    addr: &str,
) -> (Arc<LocalNode>, ChunkserverService) {
    let store = Arc::new(Mutex::new(ChunkStore::open(dir.join(id)).unwrap()));
    let node = Arc::new(LocalNode::new(id.to_string(), addr.to_string(), store.clone()));
    let svc = ChunkserverService::new(node.clone(), store);
    (node, svc)
}

fn metadata() -> ChunkMetadata {
    ChunkMetadata {
        file_name: "a.txt".into(),
        version: 1,
        chunk_names: vec!["a.txt.1.0".into()],
        file_hash: String::new(),
    }
}

#[tokio::test]
async fn test_write_follows_redirect_after_failover() {
    let dir = TempDir::new().unwrap();
    let (node_a, svc_a) = chunkserver(dir.path(), "cs-a", "127.0.0.1:7001");
    let (node_b, svc_b) = chunkserver(dir.path(), "cs-b", "127.0.0.1:7002");

    // A leads; writes land on A.
    node_a.become_leader();
    svc_a.write(vec![vec![1, 2, 3]], metadata()).await.unwrap();

    // A steps down in favor of B.
    node_a.step_down(Some("127.0.0.1:7002".into()));
    node_b.become_leader();

    // A now rejects with a redirect to B, never silently succeeding.
    let err = svc_a
        .write(vec![vec![4, 5, 6]], metadata())
        .await
        .unwrap_err();
    assert_eq!(err.redirect(), Some("127.0.0.1:7002"));
    assert!(err.is_retryable());

    // Retrying at the redirect target succeeds.
    svc_b.write(vec![vec![4, 5, 6]], metadata()).await.unwrap();
    assert_eq!(svc_b.read().unwrap(), vec![4, 5, 6]);
}

#[tokio::test]
async fn test_safe_get_rejected_on_stepped_down_node() {
    let dir = TempDir::new().unwrap();
    let (node, svc) = chunkserver(dir.path(), "cs-a", "127.0.0.1:7001");

    node.become_leader();
    svc.increment_and_get(3).await.unwrap();

    node.step_down(Some("127.0.0.1:7002".into()));

    // Relaxed read still serves the (possibly stale) local value.
    assert_eq!(svc.get(false).await.unwrap(), 3);
    // Linearizable read refuses and redirects.
    let err = svc.get(true).await.unwrap_err();
    assert_eq!(err.redirect(), Some("127.0.0.1:7002"));
}
