//! Error types for the peer registry and its collaborators.

use std::path::PathBuf;

use thiserror::Error;
use vpn_wireguard::WireGuardError;

use crate::allocation::AllocationError;

/// Errors surfaced by registry, allocation, rendering and config operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Name, public key or address already taken.
    #[error("peer already exists: {name}")]
    Conflict {
        /// The name of the peer being created.
        name: String,
    },

    /// Operation on a peer that is not in the registry.
    #[error("peer not found: {name}")]
    NotFound {
        /// The name that was looked up.
        name: String,
    },

    /// No free host address left in the prefix.
    #[error("no available addresses in {prefix}")]
    CapacityExhausted {
        /// The prefix that ran out of addresses.
        prefix: String,
    },

    /// The prefix is not IPv4.
    #[error("unsupported address family: {prefix}")]
    UnsupportedAddressFamily {
        /// The offending prefix.
        prefix: String,
    },

    /// The OS random source failed while generating keys or identifiers.
    #[error("random source failure: {0}")]
    RandomSource(String),

    /// Open, migrate or transaction-level storage error.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Malformed prefix or other configuration value.
    #[error("invalid configuration: {0}")]
    ConfigFormat(String),

    /// Peer names must contain at least one non-whitespace character.
    #[error("invalid peer name: {0:?}")]
    InvalidName(String),

    /// No `config.json` in the data directory.
    #[error("not initialized: no config at {}", path.display())]
    NotInitialized {
        /// Where the config file was expected.
        path: PathBuf,
    },

    /// `config.json` already exists.
    #[error("already initialized: config exists at {}", path.display())]
    AlreadyInitialized {
        /// The existing config file.
        path: PathBuf,
    },

    /// Filesystem error while reading or writing config artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `config.json` could not be (de)serialized.
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AllocationError> for Error {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::Exhausted { prefix } => Self::CapacityExhausted { prefix },
            AllocationError::UnsupportedFamily { prefix } => {
                Self::UnsupportedAddressFamily { prefix }
            }
            AllocationError::InvalidCidr { message } => Self::ConfigFormat(message),
        }
    }
}

impl From<WireGuardError> for Error {
    fn from(err: WireGuardError) -> Self {
        match err {
            WireGuardError::RandomSource(msg) => Self::RandomSource(msg),
            other => Self::ConfigFormat(other.to_string()),
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
