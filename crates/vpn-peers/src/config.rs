//! Network configuration for the vpn controller.
//!
//! One JSON document (`config.json`) in the data directory describes the
//! server side of the overlay: interface, port, prefix, keys and the hints
//! handed to clients. It is loaded once per command and passed around by
//! value; nothing reads it from global state.

use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use vpn_wireguard::KeyPair;

use crate::allocation::AddressPool;
use crate::error::{Error, Result};
use crate::fsutil;

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Peer-only config file written for `wg syncconf`.
pub const PEERS_FILE: &str = "peers.conf";

/// Default WireGuard interface name.
pub const DEFAULT_INTERFACE: &str = "wg0";

/// Default UDP listen port.
pub const DEFAULT_LISTEN_PORT: u16 = 51820;

/// Default server address and prefix.
pub const DEFAULT_ADDRESS: &str = "10.0.0.1/24";

/// Default DNS server handed to clients.
pub const DEFAULT_DNS: &str = "1.1.1.1";

/// Default NAT egress interface.
pub const DEFAULT_NAT_INTERFACE: &str = "eth0";

/// Server-side network configuration.
///
/// Optional values are empty strings when unset, which keeps the JSON layout
/// stable for hand editing.
#[derive(Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// WireGuard interface name, e.g. `wg0`.
    pub interface: String,
    /// UDP listen port.
    pub listen_port: u16,
    /// Server address with prefix length, e.g. `10.0.0.1/24`.
    pub address: String,
    /// Public `host:port` clients connect to; empty if unknown.
    #[serde(default)]
    pub endpoint: String,
    /// Server private key, base64.
    pub private_key: String,
    /// Server public key, base64.
    pub public_key: String,
    /// DNS server pushed to clients; empty to omit.
    #[serde(default)]
    pub dns: String,
    /// Egress interface for NAT rules; empty to omit.
    #[serde(default)]
    pub nat_interface: String,
    /// Directory holding this config, the database and rendered files.
    #[serde(skip)]
    pub data_dir: PathBuf,
}

/// Values that may be overridden when initializing a data directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Public host or `host:port`; the listen port is appended to a bare host.
    pub endpoint: Option<String>,
    /// Interface name.
    pub interface: String,
    /// Listen port.
    pub listen_port: u16,
    /// Server address with prefix length.
    pub address: String,
    /// DNS server for clients.
    pub dns: String,
    /// NAT egress interface.
    pub nat_interface: String,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            interface: DEFAULT_INTERFACE.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            address: DEFAULT_ADDRESS.to_string(),
            dns: DEFAULT_DNS.to_string(),
            nat_interface: DEFAULT_NAT_INTERFACE.to_string(),
        }
    }
}

impl NetworkConfig {
    /// Builds a config with a freshly generated server key pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigFormat`] if `options.address` is not a valid
    /// IPv4 prefix, or [`Error::RandomSource`] if key generation fails.
    pub fn generate(data_dir: &Path, options: InitOptions) -> Result<Self> {
        let pool = AddressPool::parse(&options.address)?;
        debug!(
            network = %pool.network(),
            capacity = pool.capacity(),
            "validated peer address pool"
        );
        let keys = KeyPair::generate()?;
        let endpoint = options
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| endpoint_with_port(e, options.listen_port))
            .unwrap_or_default();

        Ok(Self {
            interface: options.interface,
            listen_port: options.listen_port,
            address: options.address,
            endpoint,
            private_key: keys.private_key().to_base64(),
            public_key: keys.public_key().to_base64(),
            dns: options.dns,
            nat_interface: options.nat_interface,
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Generates and saves a config in `data_dir`. Refuses to overwrite an
    /// existing one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] if `config.json` exists, plus
    /// the errors of [`NetworkConfig::generate`] and [`NetworkConfig::save`].
    pub fn initialize(data_dir: &Path, options: InitOptions) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if path.exists() {
            return Err(Error::AlreadyInitialized { path });
        }
        let config = Self::generate(data_dir, options)?;
        config.save()?;
        Ok(config)
    }

    /// Loads `config.json` from `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the file does not exist,
    /// [`Error::Json`] if it does not parse.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotInitialized { path });
            }
            Err(e) => return Err(e.into()),
        };
        let mut config: Self = serde_json::from_str(&raw)?;
        config.data_dir = data_dir.to_path_buf();
        debug!(path = %path.display(), interface = %config.interface, "loaded network config");
        Ok(config)
    }

    /// Writes the config to `config.json`, owner-readable only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Json`] on failure.
    pub fn save(&self) -> Result<()> {
        fsutil::ensure_private_dir(&self.data_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        fsutil::write_private(&self.config_path(), &json)?;
        Ok(())
    }

    /// Path of `config.json`.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Path of the rendered server config, `<interface>.conf`.
    #[must_use]
    pub fn server_config_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.conf", self.interface))
    }

    /// Path of the rendered peer-only config.
    #[must_use]
    pub fn peers_config_path(&self) -> PathBuf {
        self.data_dir.join(PEERS_FILE)
    }

    /// The prefix peers are allocated from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigFormat`] or [`Error::UnsupportedAddressFamily`]
    /// if `address` is not an IPv4 prefix.
    pub fn pool(&self) -> Result<AddressPool> {
        Ok(AddressPool::parse(&self.address)?)
    }
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("interface", &self.interface)
            .field("listen_port", &self.listen_port)
            .field("address", &self.address)
            .field("endpoint", &self.endpoint)
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("dns", &self.dns)
            .field("nat_interface", &self.nat_interface)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

/// `$HOME/.vpn`, if a home directory is known.
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".vpn"))
}

fn endpoint_with_port(endpoint: &str, port: u16) -> String {
    if endpoint.parse::<SocketAddr>().is_ok() {
        return endpoint.to_string();
    }
    if let Ok(ip) = endpoint.parse::<IpAddr>() {
        return SocketAddr::new(ip, port).to_string();
    }
    match endpoint.rsplit_once(':') {
        Some((host, p)) if !host.contains(':') && p.parse::<u16>().is_ok() => endpoint.to_string(),
        _ => format!("{endpoint}:{port}"),
    }
}
