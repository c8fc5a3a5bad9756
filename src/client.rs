//! Client-side encoding and disk placement
//!
//! Drives the shard codec for a single file outside the replicated path:
//! read a source file, pad and split it, compute parity, and place one
//! shard per target disk path. `restore` is the inverse, reconstructing
//! missing shards from the survivors.

use crate::codec::{CodecParams, RsCodec};
use crate::common::{blake3_hex, format_bytes, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Encodes one file into a full shard set.
pub struct FileEncoder {
    params: CodecParams,
    file_path: PathBuf,
    file_size: u64,
    file_hash: String,
    shards: Vec<Vec<u8>>,
}

impl FileEncoder {
    /// Read `path` and encode it: pad, split, compute parity.
    pub fn from_file(path: impl AsRef<Path>, params: CodecParams) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        Self::from_bytes(path.to_path_buf(), data, params)
    }

    pub fn from_bytes(file_path: PathBuf, data: Vec<u8>, params: CodecParams) -> Result<Self> {
        params.validate()?;
        let file_hash = blake3_hex(&data);
        let padded = params.pad(&data);
        let mut shards = params.split(&padded)?;
        debug_assert_eq!(params.merge(&shards).unwrap(), padded);
        RsCodec::new(&params)?.encode_parity(&mut shards)?;

        tracing::debug!(
            file = %file_path.display(),
            size = %format_bytes(data.len() as u64),
            shard_len = shards[0].len(),
            "encoded file into {} shards",
            shards.len()
        );

        Ok(Self {
            params,
            file_path,
            file_size: data.len() as u64,
            file_hash,
            shards,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Original (unpadded) file length; required to invert the padding.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Blake3 digest of the source bytes.
    pub fn file_hash(&self) -> &str {
        &self.file_hash
    }

    pub fn shards(&self) -> &[Vec<u8>] {
        &self.shards
    }

    pub fn into_shards(self) -> Vec<Vec<u8>> {
        self.shards
    }

    /// Write shard `i` to `disk_paths[i]`, one path per shard.
    pub fn store(&self, disk_paths: &[PathBuf]) -> Result<()> {
        if disk_paths.len() != self.params.total_shards() {
            return Err(Error::ShardCountMismatch {
                expected: self.params.total_shards(),
                actual: disk_paths.len(),
            });
        }
        for (shard, path) in self.shards.iter().zip(disk_paths) {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, shard)?;
        }
        tracing::info!(
            file = %self.file_path.display(),
            disks = disk_paths.len(),
            "stored shards"
        );
        Ok(())
    }
}

/// Rebuild a file of `file_size` bytes from its shard files.
///
/// Unreadable or missing shard files are treated as erasures and
/// reconstructed from the survivors, tolerating up to `parity_shards`
/// losses.
pub fn restore(disk_paths: &[PathBuf], file_size: u64, params: CodecParams) -> Result<Vec<u8>> {
    if disk_paths.len() != params.total_shards() {
        return Err(Error::ShardCountMismatch {
            expected: params.total_shards(),
            actual: disk_paths.len(),
        });
    }

    let mut shards: Vec<Option<Vec<u8>>> = disk_paths
        .iter()
        .map(|path| match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "shard unreadable, treating as erased");
                None
            }
        })
        .collect();

    RsCodec::new(&params)?.reconstruct(&mut shards)?;

    let shards: Vec<Vec<u8>> = shards.into_iter().flatten().collect();
    let mut padded = params.merge(&shards)?;
    if (file_size as usize) > padded.len() {
        return Err(Error::Codec(format!(
            "recovered {} padded bytes, fewer than the recorded file size {}",
            padded.len(),
            file_size
        )));
    }
    padded.truncate(file_size as usize);
    Ok(padded)
}
