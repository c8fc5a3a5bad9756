//! Shard codec: file bytes ⇄ shards
//!
//! Pure, stateless transformations shared by the client encoder and the
//! recovery path:
//! - `pad`: zero-extend a file to a whole number of shard groups
//! - `split`: deinterleave padded bytes into data shards, block by block
//! - `merge`: exact inverse of `split` over the data shards
//!
//! Parity computation and shard reconstruction live in [`rs_codec`].

pub mod rs_codec;

pub use rs_codec::RsCodec;

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Erasure-coding geometry.
///
/// `block_size` and `data_shards` are independent knobs; the interleaving
/// offset arithmetic below must never assume they are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecParams {
    /// Bytes per interleaving block
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Number of data shards
    #[serde(default = "default_data_shards")]
    pub data_shards: usize,

    /// Number of parity shards
    #[serde(default = "default_parity_shards")]
    pub parity_shards: usize,
}

fn default_block_size() -> usize {
    4
}
fn default_data_shards() -> usize {
    4
}
fn default_parity_shards() -> usize {
    2
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            data_shards: default_data_shards(),
            parity_shards: default_parity_shards(),
        }
    }
}

impl CodecParams {
    pub fn new(block_size: usize, data_shards: usize, parity_shards: usize) -> Result<Self> {
        let params = Self {
            block_size,
            data_shards,
            parity_shards,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.data_shards == 0 || self.parity_shards == 0 {
            return Err(Error::InvalidConfig(
                "block_size, data_shards and parity_shards must all be nonzero".into(),
            ));
        }
        Ok(())
    }

    /// Total shard count (data + parity)
    pub fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }

    /// Bytes consumed by one full round of data shards
    pub fn group_size(&self) -> usize {
        self.data_shards * self.block_size
    }

    /// Zero-extend `data` to the next multiple of [`group_size`].
    ///
    /// Returns the input unchanged (including empty input) when it is
    /// already aligned. Never truncates; the original length must be
    /// tracked by the caller to invert the padding.
    ///
    /// [`group_size`]: CodecParams::group_size
    pub fn pad(&self, data: &[u8]) -> Vec<u8> {
        let group = self.group_size();
        let mut padded = data.to_vec();
        let rem = padded.len() % group;
        if rem != 0 {
            padded.resize(padded.len() + group - rem, 0);
        }
        padded
    }

    /// Deinterleave padded bytes into `total_shards()` equal-length shards.
    ///
    /// Block `i` lands in data shard `i % data_shards` at offset
    /// `(i / data_shards) * block_size`. Parity shards are allocated
    /// zeroed and filled later by [`RsCodec::encode_parity`].
    pub fn split(&self, padded: &[u8]) -> Result<Vec<Vec<u8>>> {
        if padded.len() % self.group_size() != 0 {
            return Err(Error::Codec(format!(
                "input length {} is not a multiple of the {}-byte shard group",
                padded.len(),
                self.group_size()
            )));
        }

        let shard_len = padded.len() / self.data_shards;
        let mut shards = vec![vec![0u8; shard_len]; self.total_shards()];

        let block_cnt = padded.len() / self.block_size;
        for block_idx in 0..block_cnt {
            let src = block_idx * self.block_size;
            let shard_idx = block_idx % self.data_shards;
            let dst = block_idx / self.data_shards * self.block_size;
            shards[shard_idx][dst..dst + self.block_size]
                .copy_from_slice(&padded[src..src + self.block_size]);
        }

        Ok(shards)
    }

    /// Re-interleave the data shards back into padded file bytes.
    ///
    /// Inverse of [`split`] restricted to the first `data_shards` shards:
    /// `merge(split(pad(f))) == pad(f)` for every byte sequence `f`.
    ///
    /// [`split`]: CodecParams::split
    pub fn merge(&self, shards: &[Vec<u8>]) -> Result<Vec<u8>> {
        if shards.len() < self.data_shards {
            return Err(Error::ShardCountMismatch {
                expected: self.data_shards,
                actual: shards.len(),
            });
        }
        let shard_len = shards[0].len();
        if shards[..self.data_shards]
            .iter()
            .any(|s| s.len() != shard_len)
        {
            return Err(Error::Codec("data shards differ in length".into()));
        }

        let mut data = vec![0u8; shard_len * self.data_shards];
        let block_cnt = data.len() / self.block_size;
        for block_idx in 0..block_cnt {
            let dst = block_idx * self.block_size;
            let shard_idx = block_idx % self.data_shards;
            let src = block_idx / self.data_shards * self.block_size;
            data[dst..dst + self.block_size]
                .copy_from_slice(&shards[shard_idx][src..src + self.block_size]);
        }

        Ok(data)
    }
}
