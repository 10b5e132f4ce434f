//! Error types shared by the search, persistence and verification layers.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::onion::AddressError;

/// Errors that can occur while generating, saving or verifying an identity
#[derive(Error, Debug)]
pub enum VanityError {
    #[error("Entropy source unavailable: {0}")]
    EntropyFailure(String),

    #[error("Invalid prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: String },

    #[error("Worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("Malformed onion address: {0}")]
    Address(#[from] AddressError),

    #[error("IO error at {}: {source}", .path.display())]
    PersistenceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No key set found in {}", .0.display())]
    NotFound(PathBuf),

    #[error("Corrupt key set file {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Key set integrity mismatch: {0}")]
    IntegrityMismatch(Mismatch),

    #[error("Generation stopped by user")]
    Stopped,

    #[error("No match found within {0:?}")]
    TimedOut(Duration),

    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("Worker thread panicked")]
    WorkerPanicked,
}

impl VanityError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VanityError::PersistenceIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        VanityError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means the persisted identity must not be used.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            VanityError::IntegrityMismatch(_) | VanityError::Corrupt { .. }
        )
    }
}

/// Which cross-check of a persisted key set failed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    #[error("secret key file header is not the ed25519v1-secret type0 tag")]
    SecretHeader,

    #[error("public key file header is not the ed25519v1-public type0 tag")]
    PublicHeader,

    #[error("public key derived from the secret key differs from the public key file")]
    SecretVsPublicKey,

    #[error("hostname is not a well-formed onion address")]
    HostnameMalformed,

    #[error("hostname checksum or version is invalid")]
    HostnameChecksum,

    #[error("public key embedded in the hostname differs from the public key file")]
    HostnameVsPublicKey,

    #[error("metadata record disagrees with the hostname or public key")]
    Metadata,
}

pub type Result<T, E = VanityError> = std::result::Result<T, E>;
