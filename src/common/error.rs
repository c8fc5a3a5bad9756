//! Error types for shardfs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Codec Errors ===
    #[error("Erasure coding error: {0}")]
    Codec(String),

    #[error("Shard count mismatch: expected {expected}, got {actual}")]
    ShardCountMismatch { expected: usize, actual: usize },

    #[error("Checksum mismatch for chunk {chunk}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        chunk: String,
        expected: u32,
        actual: u32,
    },

    // === Consensus Errors ===
    #[error("Not leader: current leader is {0}")]
    NotLeader(String),

    #[error("Failed to encode log command: {0}")]
    Serialization(String),

    #[error("Consensus error: {0}")]
    Consensus(String),

    // === Master Errors ===
    #[error("Append position {append_at} out of range for version {version} ({chunks} chunks)")]
    AppendOutOfRange {
        append_at: u64,
        version: u64,
        chunks: usize,
    },

    #[error("Unknown file: {0}")]
    UnknownFile(String),

    #[error("Version index persistence error: {0}")]
    Persistence(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Is this a retryable error?
    ///
    /// `NotLeader` carries a redirect hint; the caller retries at the hinted
    /// address. Everything else aborts the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NotLeader(_) | Error::Consensus(_))
    }

    /// The redirect target for a leadership rejection, if any.
    pub fn redirect(&self) -> Option<&str> {
        match self {
            Error::NotLeader(leader) => Some(leader),
            _ => None,
        }
    }
}

impl From<reed_solomon_erasure::Error> for Error {
    fn from(e: reed_solomon_erasure::Error) -> Self {
        Error::Codec(e.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_hint() {
        let err = Error::NotLeader("127.0.0.1:7001".to_string());
        assert!(err.is_retryable());
        assert_eq!(err.redirect(), Some("127.0.0.1:7001"));

        let err = Error::Serialization("bad command".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.redirect(), None);
    }
}
