//! Error types for WireGuard key operations.

use thiserror::Error;

/// Errors that can occur during WireGuard key operations.
#[derive(Debug, Error)]
pub enum WireGuardError {
    /// Invalid base64 encoding.
    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(String),

    /// Invalid key length.
    #[error("invalid key length: expected 32, got {0}")]
    InvalidKeyLength(usize),

    /// The operating system random source could not be read.
    #[error("random source unavailable: {0}")]
    RandomSource(String),
}
