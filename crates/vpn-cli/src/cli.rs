//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Manage WireGuard peers for a single-host overlay network.
#[derive(Parser, Debug, Clone)]
#[command(name = "vpn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding config.json, vpn.db and rendered configs.
    ///
    /// Defaults to `$HOME/.vpn`.
    #[arg(short, long, env = "VPN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create config.json with a fresh server key pair.
    Init(InitArgs),

    /// Add a peer and print its client config.
    Add {
        /// Unique peer name.
        name: String,
    },

    /// Remove a peer.
    #[command(visible_alias = "rm")]
    Remove {
        /// Peer name.
        name: String,
    },

    /// List peers, oldest first.
    #[command(visible_alias = "ls")]
    List,

    /// Include a disabled peer in the server config again.
    Enable {
        /// Peer name.
        name: String,
    },

    /// Keep a peer registered but drop it from the server config.
    Disable {
        /// Peer name.
        name: String,
    },

    /// Print the client config for a peer.
    ClientConfig {
        /// Peer name.
        name: String,
    },

    /// Print the full server config.
    ServerConfig,

    /// Print only the peer sections of the server config.
    PeerConfig,

    /// Write the server and peer-only configs into the data directory.
    Export,
}

/// Arguments for the init command.
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Public host or host:port clients connect to.
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// WireGuard interface name.
    #[arg(long, default_value = vpn_peers::config::DEFAULT_INTERFACE)]
    pub interface: String,

    /// UDP listen port.
    #[arg(long, default_value_t = vpn_peers::config::DEFAULT_LISTEN_PORT)]
    pub listen_port: u16,

    /// Server address with prefix length.
    #[arg(long, default_value = vpn_peers::config::DEFAULT_ADDRESS)]
    pub address: String,

    /// DNS server pushed to clients; empty to omit.
    #[arg(long, default_value = vpn_peers::config::DEFAULT_DNS)]
    pub dns: String,

    /// Egress interface for NAT rules; empty to omit.
    #[arg(long, default_value = vpn_peers::config::DEFAULT_NAT_INTERFACE)]
    pub nat_interface: String,
}

impl From<InitArgs> for vpn_peers::InitOptions {
    fn from(args: InitArgs) -> Self {
        Self {
            endpoint: args.endpoint,
            interface: args.interface,
            listen_port: args.listen_port,
            address: args.address,
            dns: args.dns,
            nat_interface: args.nat_interface,
        }
    }
}
