//! Entry point for front ends: one network config bound to one registry.

use std::path::Path;

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::fsutil;
use crate::registry::PeerRegistry;
use crate::render::{self, RenderCapabilities};
use crate::types::{Peer, PeerView};

/// Paths written by [`NetworkManager::export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    /// Full server config for `wg-quick`.
    pub server_config: std::path::PathBuf,
    /// Peer sections only, for `wg syncconf`.
    pub peers_config: std::path::PathBuf,
}

/// Binds a loaded [`NetworkConfig`] to its [`PeerRegistry`].
#[derive(Debug)]
pub struct NetworkManager {
    config: NetworkConfig,
    registry: PeerRegistry,
    capabilities: RenderCapabilities,
}

impl NetworkManager {
    /// Creates a manager from parts.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        registry: PeerRegistry,
        capabilities: RenderCapabilities,
    ) -> Self {
        Self {
            config,
            registry,
            capabilities,
        }
    }

    /// Loads `config.json` and opens `vpn.db` in `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotInitialized`] if there is no config, or
    /// the registry's open errors.
    pub fn open(data_dir: &Path, capabilities: RenderCapabilities) -> Result<Self> {
        let config = NetworkConfig::load(data_dir)?;
        let registry = PeerRegistry::open_in_dir(data_dir)?;
        Ok(Self::new(config, registry, capabilities))
    }

    /// The loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// The underlying registry.
    #[must_use]
    pub const fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Creates a peer in the configured prefix.
    ///
    /// # Errors
    ///
    /// See [`NetworkConfig::pool`] and [`PeerRegistry::create_peer_in`].
    pub fn add_peer(&self, name: &str) -> Result<Peer> {
        let pool = self.config.pool()?;
        self.registry.create_peer_in(name, &pool)
    }

    /// Removes a peer.
    ///
    /// # Errors
    ///
    /// See [`PeerRegistry::remove_peer`].
    pub fn remove_peer(&self, name: &str) -> Result<()> {
        self.registry.remove_peer(name)
    }

    /// Enables or disables a peer.
    ///
    /// # Errors
    ///
    /// See [`PeerRegistry::set_enabled`].
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        self.registry.set_enabled(name, enabled)
    }

    /// All peers, oldest first.
    ///
    /// # Errors
    ///
    /// See [`PeerRegistry::list_peers`].
    pub fn list_peers(&self) -> Result<Vec<Peer>> {
        self.registry.list_peers()
    }

    /// All peers without private keys, for untrusted callers.
    ///
    /// # Errors
    ///
    /// See [`PeerRegistry::list_peers`].
    pub fn peer_views(&self) -> Result<Vec<PeerView>> {
        Ok(self.list_peers()?.iter().map(PeerView::from).collect())
    }

    /// Renders the server config from the currently enabled peers.
    ///
    /// # Errors
    ///
    /// See [`PeerRegistry::enabled_peers`].
    pub fn server_config(&self) -> Result<String> {
        let peers = self.registry.enabled_peers()?;
        Ok(render::render_server_config(
            &self.config,
            &peers,
            self.capabilities,
        ))
    }

    /// Renders the peer-only config for `wg syncconf`.
    ///
    /// # Errors
    ///
    /// See [`PeerRegistry::enabled_peers`].
    pub fn peers_config(&self) -> Result<String> {
        Ok(render::extract_peer_sections(&self.server_config()?))
    }

    /// Renders the client config for `peer`.
    #[must_use]
    pub fn client_config(&self, peer: &Peer) -> String {
        render::render_client_config(&self.config, peer)
    }

    /// Renders the client config for the peer named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if no such peer exists.
    pub fn client_config_for(&self, name: &str) -> Result<String> {
        let peer = self.registry.get_peer(name)?;
        Ok(self.client_config(&peer))
    }

    /// Writes the server config and the peer-only config into the data
    /// directory, owner-readable only.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] on write failures or registry errors.
    pub fn export(&self) -> Result<ExportedFiles> {
        let server = self.server_config()?;
        let peers = render::extract_peer_sections(&server);

        let files = ExportedFiles {
            server_config: self.config.server_config_path(),
            peers_config: self.config.peers_config_path(),
        };
        fsutil::ensure_private_dir(&self.config.data_dir)?;
        fsutil::write_private(&files.server_config, &server)?;
        fsutil::write_private(&files.peers_config, &peers)?;
        tracing::info!(
            server = %files.server_config.display(),
            peers = %files.peers_config.display(),
            "exported tunnel configs"
        );
        Ok(files)
    }
}
