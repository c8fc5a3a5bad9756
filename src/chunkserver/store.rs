//! Chunk store state machine
//!
//! Per-node storage logic applied from the consensus log:
//! - a counter and a bytes register (the `Get` / `IncrementAndGet` /
//!   `SetBytesValue` operations)
//! - persisted chunk objects, one file per shard payload, with a CRC32
//!   footer
//!
//! Applying a committed operation touches only this node's state, so
//! replaying the log on any replica produces identical state.

use crate::chunkserver::operation::{Operation, OperationOutput};
use crate::common::{crc32, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Chunk file format: [PAYLOAD:n][CRC32:4]
pub struct ChunkStore {
    data_dir: PathBuf,
    value: i64,
    bytes_value: Vec<u8>,
    last_applied: u64,
    /// Chunk-object names of the most recent write, in shard order
    latest_chunks: Vec<String>,
}

impl ChunkStore {
    /// Open or create the store under `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            value: 0,
            bytes_value: Vec::new(),
            last_applied: 0,
            latest_chunks: Vec::new(),
        })
    }

    /// Current counter value (fast-path read, may be stale on a follower).
    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    /// Apply a committed operation at `index`.
    pub fn apply(&mut self, op: Operation, index: u64) -> Result<OperationOutput> {
        let output = match op {
            Operation::Get => OperationOutput::Value(self.value),
            Operation::IncrementAndGet { delta } => {
                self.value += delta;
                OperationOutput::Value(self.value)
            }
            Operation::SetBytesValue { value } => {
                self.bytes_value = value;
                OperationOutput::Ack
            }
            Operation::Write { shards, metadata } => {
                if shards.len() != metadata.chunk_names.len() {
                    return Err(Error::ShardCountMismatch {
                        expected: metadata.chunk_names.len(),
                        actual: shards.len(),
                    });
                }
                for (name, shard) in metadata.chunk_names.iter().zip(&shards) {
                    self.write_chunk(name, shard)?;
                }
                tracing::debug!(
                    file = %metadata.file_name,
                    version = metadata.version,
                    chunks = metadata.chunk_names.len(),
                    index,
                    "applied shard write"
                );
                self.latest_chunks = metadata.chunk_names;
                OperationOutput::Ack
            }
        };
        self.last_applied = index;
        Ok(output)
    }

    /// Concatenated payloads of the most recently written chunks.
    ///
    /// Local disk read; no consensus involved.
    pub fn read_disk(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        for name in &self.latest_chunks {
            data.extend_from_slice(&self.read_chunk(name)?);
        }
        Ok(data)
    }

    /// Read one chunk payload, verifying its checksum footer.
    pub fn read_chunk(&self, name: &str) -> Result<Vec<u8>> {
        let raw = fs::read(self.chunk_path(name))?;
        if raw.len() < 4 {
            return Err(Error::ChecksumMismatch {
                chunk: name.to_string(),
                expected: 0,
                actual: 0,
            });
        }
        let (payload, footer) = raw.split_at(raw.len() - 4);
        let expected = u32::from_le_bytes(footer.try_into().unwrap());
        let actual = crc32(payload);
        if expected != actual {
            return Err(Error::ChecksumMismatch {
                chunk: name.to_string(),
                expected,
                actual,
            });
        }
        Ok(payload.to_vec())
    }

    /// Persist one chunk atomically (temp file + rename).
    fn write_chunk(&self, name: &str, payload: &[u8]) -> Result<()> {
        let path = self.chunk_path(name);
        let tmp = path.with_extension("tmp");

        let mut record = Vec::with_capacity(payload.len() + 4);
        record.extend_from_slice(payload);
        record.extend_from_slice(&crc32(payload).to_le_bytes());

        fs::write(&tmp, &record)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn chunk_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn bytes_value(&self) -> &[u8] {
        &self.bytes_value
    }
}
