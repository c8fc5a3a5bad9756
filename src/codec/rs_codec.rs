//! Systematic Reed–Solomon wrapper
//!
//! The field arithmetic is delegated to `reed-solomon-erasure`; this type
//! pins the shard geometry and adapts the crate's API to shardfs buffers.

use crate::codec::CodecParams;
use crate::common::{Error, Result};
use reed_solomon_erasure::galois_8::ReedSolomon;

pub struct RsCodec {
    data_shards: usize,
    parity_shards: usize,
    inner: ReedSolomon,
}

impl RsCodec {
    pub fn new(params: &CodecParams) -> Result<Self> {
        params.validate()?;
        let inner = ReedSolomon::new(params.data_shards, params.parity_shards)?;
        Ok(Self {
            data_shards: params.data_shards,
            parity_shards: params.parity_shards,
            inner,
        })
    }

    pub fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }

    /// Fill the parity shards in place from the populated data shards.
    ///
    /// A zero-length shard group (empty file) is a no-op rather than an
    /// error: the degenerate shard set is still valid.
    pub fn encode_parity(&self, shards: &mut [Vec<u8>]) -> Result<()> {
        if shards.len() != self.total_shards() {
            return Err(Error::ShardCountMismatch {
                expected: self.total_shards(),
                actual: shards.len(),
            });
        }
        if shards[0].is_empty() {
            return Ok(());
        }
        self.inner.encode(shards)?;
        Ok(())
    }

    /// Recover erased shards (`None` entries) in place.
    ///
    /// Succeeds as long as no more than `parity_shards` entries are erased.
    pub fn reconstruct(&self, shards: &mut [Option<Vec<u8>>]) -> Result<()> {
        if shards.len() != self.total_shards() {
            return Err(Error::ShardCountMismatch {
                expected: self.total_shards(),
                actual: shards.len(),
            });
        }
        if shards.iter().flatten().next().is_some_and(|s| s.is_empty()) {
            // Empty-file shard set: nothing to recover.
            for slot in shards.iter_mut() {
                slot.get_or_insert_with(Vec::new);
            }
            return Ok(());
        }
        self.inner.reconstruct(shards)?;
        Ok(())
    }

    /// Check that the parity shards are consistent with the data shards.
    pub fn verify(&self, shards: &[Vec<u8>]) -> Result<bool> {
        if shards.first().is_some_and(|s| s.is_empty()) {
            return Ok(true);
        }
        Ok(self.inner.verify(shards)?)
    }
}
