//! Peer records and their projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::allocation::strip_host_mask;

/// A peer as stored in the registry.
///
/// The registry keeps the peer's private key so a client config can be
/// regenerated at any time. Whoever can read the store can impersonate every
/// peer; treat the data directory accordingly.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Opaque random identifier, 16 hex characters.
    pub id: String,
    /// Unique human-readable name.
    pub name: String,
    /// Base64 Curve25519 public key.
    pub public_key: String,
    /// Base64 Curve25519 private key; `None` for rows written before the
    /// registry stored private keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Allocated address with the single-host mask, e.g. `10.0.0.2/32`.
    pub allowed_ip: String,
    /// Disabled peers stay in the registry but are left out of the server
    /// config.
    pub enabled: bool,
    /// Creation time, UTC.
    pub created_at: DateTime<Utc>,
}

impl Peer {
    /// Returns the allocated address without the `/32` suffix.
    #[must_use]
    pub fn address(&self) -> &str {
        strip_host_mask(&self.allowed_ip)
    }

    /// Projects the peer into the form used for the server config.
    #[must_use]
    pub fn to_enabled(&self) -> EnabledPeer {
        EnabledPeer {
            public_key: self.public_key.clone(),
            allowed_ip: self.allowed_ip.clone(),
        }
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("allowed_ip", &self.allowed_ip)
            .field("enabled", &self.enabled)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// The subset of a peer the server config needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledPeer {
    /// Base64 Curve25519 public key.
    pub public_key: String,
    /// Allocated address with the single-host mask.
    pub allowed_ip: String,
}

/// A peer as shown to untrusted callers: no private key, bare address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerView {
    /// Peer name.
    pub name: String,
    /// Base64 public key.
    pub public_key: String,
    /// Address without the `/32` suffix.
    pub ip: String,
    /// Whether the peer is in the server config.
    pub enabled: bool,
    /// Creation date, `YYYY-MM-DD`.
    pub created: String,
}

impl From<&Peer> for PeerView {
    fn from(peer: &Peer) -> Self {
        Self {
            name: peer.name.clone(),
            public_key: peer.public_key.clone(),
            ip: peer.address().to_string(),
            enabled: peer.enabled,
            created: peer.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}
