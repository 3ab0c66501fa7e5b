//! WireGuard key material for the vpn controller.
//!
//! This crate generates the Curve25519 key pairs handed out to peers and the
//! server, plus the opaque identifiers the peer registry uses as primary keys.

pub mod error;
mod keys;

pub use error::WireGuardError;
pub use keys::{generate_id, generate_keypair, KeyPair, PrivateKey, PublicKey, ID_SIZE, KEY_SIZE};
