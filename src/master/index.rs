//! Versioned file index
//!
//! Maps `filename → (version → ordered chunk-name list)` plus a latest
//! version pointer per file. New versions are copy-on-write: an append
//! reuses the untouched chunk-name prefix and replaces only the affected
//! suffix. The whole index is persisted synchronously after every mutation
//! and reloaded wholesale at master startup; losing the persisted file
//! loses all file history.

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// The version registered by a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVersion {
    pub version: u64,
    pub chunks: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    versions: HashMap<String, BTreeMap<u64, Vec<String>>>,
    latest: HashMap<String, u64>,
}

#[derive(Debug)]
pub struct VersionIndex {
    path: PathBuf,
    block_size: u64,
    state: Persisted,
}

impl VersionIndex {
    /// Open the index at `path`, reloading persisted state if present.
    ///
    /// A missing file yields an empty index; an unreadable or corrupt file
    /// is fatal, since serving without history would silently fork it.
    pub fn open(path: impl AsRef<Path>, block_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let bytes = fs::read(&path)
                .map_err(|e| Error::Persistence(format!("read {}: {}", path.display(), e)))?;
            bincode::deserialize(&bytes)
                .map_err(|e| Error::Persistence(format!("decode {}: {}", path.display(), e)))?
        } else {
            Persisted::default()
        };

        tracing::info!(
            path = %path.display(),
            files = state.latest.len(),
            "version index loaded"
        );

        Ok(Self {
            path,
            block_size: block_size as u64,
            state,
        })
    }

    /// Register a new version of `filename`.
    ///
    /// `append_at == 0` is a full write: a fresh chunk list covering the
    /// whole file. Otherwise the previous version's first `append_at`
    /// chunk names are kept and the suffix is replaced with newly named
    /// chunks up to `ceil(file_size / block_size)`. An `append_at` outside
    /// the previous list, or at or past the new chunk count, is rejected.
    pub fn add_file_version(
        &mut self,
        filename: &str,
        file_size: u64,
        append_at: u64,
        write_flag: &str,
    ) -> Result<NewVersion> {
        let chunk_count = file_size.div_ceil(self.block_size);
        let latest = self.state.latest.get(filename).copied().unwrap_or(0);
        let new_version = latest + 1;

        let chunks = if append_at == 0 {
            (0..chunk_count)
                .map(|i| chunk_name(filename, new_version, i))
                .collect()
        } else {
            let previous = self
                .state
                .versions
                .get(filename)
                .and_then(|versions| versions.get(&latest))
                .ok_or_else(|| Error::UnknownFile(filename.to_string()))?;

            if append_at > previous.len() as u64 || append_at >= chunk_count {
                return Err(Error::AppendOutOfRange {
                    append_at,
                    version: latest,
                    chunks: previous.len(),
                });
            }

            let mut chunks: Vec<String> = previous[..append_at as usize].to_vec();
            chunks.extend((append_at..chunk_count).map(|i| chunk_name(filename, new_version, i)));
            chunks
        };

        tracing::info!(
            file = filename,
            version = new_version,
            size = file_size,
            append_at,
            flag = write_flag,
            chunks = chunks.len(),
            "registered file version"
        );

        self.state
            .versions
            .entry(filename.to_string())
            .or_default()
            .insert(new_version, chunks.clone());
        self.state.latest.insert(filename.to_string(), new_version);

        self.save();

        Ok(NewVersion {
            version: new_version,
            chunks,
        })
    }

    /// Latest version pointer for `filename`.
    pub fn latest_version(&self, filename: &str) -> Option<u64> {
        self.state.latest.get(filename).copied()
    }

    /// Chunk-name list of one version.
    pub fn chunk_list(&self, filename: &str, version: u64) -> Option<&[String]> {
        self.state
            .versions
            .get(filename)
            .and_then(|versions| versions.get(&version))
            .map(|chunks| chunks.as_slice())
    }

    /// Registered file names.
    pub fn files(&self) -> Vec<&str> {
        self.state.latest.keys().map(String::as_str).collect()
    }

    /// Persist the whole index (temp file + rename).
    ///
    /// Failure is logged, not propagated: the in-memory mutation stands,
    /// at the risk of index/chunk-store divergence after a crash.
    fn save(&self) {
        let result: Result<()> = (|| {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let bytes = bincode::serialize(&self.state)
                .map_err(|e| Error::Persistence(e.to_string()))?;
            let tmp = self.path.with_extension("tmp");
            fs::write(&tmp, bytes)?;
            fs::rename(&tmp, &self.path)?;
            Ok(())
        })();

        if let Err(e) = result {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "failed to persist version index; index and chunk stores may diverge"
            );
        }
    }
}

fn chunk_name(filename: &str, version: u64, seq: u64) -> String {
    format!("{}.{}.{}", filename, version, seq)
}
