//! # vpn-peers
//!
//! Membership of a private WireGuard overlay network.
//!
//! Provides:
//! - A durable [`PeerRegistry`] that issues keys and addresses atomically
//! - Deterministic lowest-free [`allocation`] inside the server prefix
//! - Pure [`render`] functions for server, client and peer-only configs
//! - The [`NetworkConfig`] document and the [`NetworkManager`] binding both
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   create/remove/list   ┌──────────────┐
//! │ NetworkManager│──────────────────────►│ PeerRegistry │──► vpn.db
//! └──────┬───────┘                        └──────┬───────┘
//!        │ render_*                              │ KeyPair, AddressPool
//!        ▼                                       ▼
//!   wg0.conf / peers.conf              vpn-wireguard, allocation
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod allocation;
pub mod config;
pub mod error;
mod fsutil;
pub mod manager;
pub mod registry;
pub mod render;
mod schema;
pub mod types;

pub use allocation::{allocate_address, AddressPool, AllocationError};
pub use config::{default_data_dir, InitOptions, NetworkConfig};
pub use error::{Error, Result};
pub use manager::{ExportedFiles, NetworkManager};
pub use registry::PeerRegistry;
pub use render::{extract_peer_sections, render_client_config, render_server_config, RenderCapabilities};
pub use schema::DB_FILE;
pub use types::{EnabledPeer, Peer, PeerView};
