//! Replicated log commands
//!
//! Every mutation of a chunkserver goes through the consensus log as a
//! serialized [`Operation`]. Applying a committed operation is
//! deterministic, so replaying the log on any replica reproduces the same
//! state.

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Metadata accompanying a shard write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Owning file
    pub file_name: String,
    /// File version this write belongs to
    pub version: u64,
    /// Chunk-object name for each shard payload, in order
    pub chunk_names: Vec<String>,
    /// Client-computed blake3 digest of the source file
    pub file_hash: String,
}

/// Command variants submitted through the replicated log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    /// Read the counter through the log (read-index fallback)
    Get,
    /// Add `delta` to the counter and return the new value
    IncrementAndGet { delta: i64 },
    /// Replace the bytes register
    SetBytesValue { value: Vec<u8> },
    /// Persist shard payloads as named chunk objects
    Write {
        shards: Vec<Vec<u8>>,
        metadata: ChunkMetadata,
    },
}

impl Operation {
    /// Encode for log submission.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode a committed log entry.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Outcome of applying a committed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutput {
    Value(i64),
    Ack,
}

impl OperationOutput {
    pub fn value(&self) -> Option<i64> {
        match self {
            OperationOutput::Value(v) => Some(*v),
            OperationOutput::Ack => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_encoding() {
        let op = Operation::Write {
            shards: vec![vec![1, 2, 3], vec![4, 5, 6]],
            metadata: ChunkMetadata {
                file_name: "a.txt".into(),
                version: 1,
                chunk_names: vec!["a.txt.1.0".into(), "a.txt.1.1".into()],
                file_hash: "deadbeef".into(),
            },
        };
        let bytes = op.encode().unwrap();
        match Operation::decode(&bytes).unwrap() {
            Operation::Write { shards, metadata } => {
                assert_eq!(shards.len(), 2);
                assert_eq!(metadata.file_name, "a.txt");
                assert_eq!(metadata.chunk_names.len(), 2);
            }
            other => panic!("decoded wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_is_serialization_error() {
        let err = Operation::decode(&[]).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
