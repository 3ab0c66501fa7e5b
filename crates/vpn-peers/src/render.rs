//! WireGuard configuration file rendering.
//!
//! Produces the INI-style text consumed by `wg-quick` (full server and client
//! configs) and by `wg syncconf` (peer sections only). Everything here is a
//! pure function of its inputs.

use std::fmt::Write as FmtWrite;

use crate::config::NetworkConfig;
use crate::types::{EnabledPeer, Peer};

/// Routes all client traffic through the tunnel.
pub const CLIENT_ALLOWED_IPS: &str = "0.0.0.0/0";

/// Keepalive interval for clients, in seconds.
pub const CLIENT_KEEPALIVE_SECS: u16 = 25;

const INTERFACE_HEADER: &str = "[Interface]";
const PEER_HEADER: &str = "[Peer]";

/// What the host applying the config can do.
///
/// The renderer never probes the platform itself; callers decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderCapabilities {
    /// `iptables` is available for `PostUp`/`PostDown` NAT rules.
    pub firewall_rules: bool,
}

impl RenderCapabilities {
    /// Capabilities of the host this binary was built for: `iptables` rules
    /// on Linux, none elsewhere.
    #[must_use]
    pub const fn host() -> Self {
        Self {
            firewall_rules: cfg!(target_os = "linux"),
        }
    }
}

/// Renders the server's `[Interface]` block followed by one `[Peer]` block
/// per entry of `peers`, in order.
#[must_use]
pub fn render_server_config(
    config: &NetworkConfig,
    peers: &[EnabledPeer],
    capabilities: RenderCapabilities,
) -> String {
    let mut output = String::new();

    output.push_str(INTERFACE_HEADER);
    output.push('\n');
    let _ = writeln!(output, "PrivateKey = {}", config.private_key);
    let _ = writeln!(output, "Address = {}", config.address);
    let _ = writeln!(output, "ListenPort = {}", config.listen_port);

    if !config.nat_interface.is_empty() && capabilities.firewall_rules {
        let nat = &config.nat_interface;
        let _ = writeln!(
            output,
            "PostUp = iptables -A FORWARD -i %i -j ACCEPT; iptables -t nat -A POSTROUTING -o {nat} -j MASQUERADE"
        );
        let _ = writeln!(
            output,
            "PostDown = iptables -D FORWARD -i %i -j ACCEPT; iptables -t nat -D POSTROUTING -o {nat} -j MASQUERADE"
        );
    }

    for peer in peers {
        output.push('\n');
        output.push_str(PEER_HEADER);
        output.push('\n');
        let _ = writeln!(output, "PublicKey = {}", peer.public_key);
        let _ = writeln!(output, "AllowedIPs = {}", peer.allowed_ip);
    }

    output
}

/// Renders the config a peer imports on its own device.
///
/// Rows created before private keys were stored render an empty
/// `PrivateKey` value for the operator to fill in.
#[must_use]
pub fn render_client_config(config: &NetworkConfig, peer: &Peer) -> String {
    let mut output = String::new();

    output.push_str(INTERFACE_HEADER);
    output.push('\n');
    let _ = writeln!(
        output,
        "PrivateKey = {}",
        peer.private_key.as_deref().unwrap_or_default()
    );
    let _ = writeln!(output, "Address = {}", peer.allowed_ip);
    if !config.dns.is_empty() {
        let _ = writeln!(output, "DNS = {}", config.dns);
    }

    output.push('\n');
    output.push_str(PEER_HEADER);
    output.push('\n');
    let _ = writeln!(output, "PublicKey = {}", config.public_key);
    if !config.endpoint.is_empty() {
        let _ = writeln!(output, "Endpoint = {}", config.endpoint);
    }
    let _ = writeln!(output, "AllowedIPs = {CLIENT_ALLOWED_IPS}");
    let _ = writeln!(output, "PersistentKeepalive = {CLIENT_KEEPALIVE_SECS}");

    output
}

/// Scanner state for [`extract_peer_sections`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    OutsidePeer,
    InsidePeer,
}

impl Section {
    fn next(self, line: &str) -> Self {
        let line = line.trim_start();
        if line.starts_with(PEER_HEADER) {
            Self::InsidePeer
        } else if line.starts_with(INTERFACE_HEADER) {
            Self::OutsidePeer
        } else {
            self
        }
    }
}

/// Keeps only the lines inside `[Peer]` sections, in order.
///
/// Works on any config text, not only on output of this module: a section
/// runs from a `[Peer]` header to the next `[Interface]` or `[Peer]` header.
/// Lines are split and re-joined on `\n`, so for rendered server configs the
/// result is exactly the text from the first `[Peer]` header onwards.
#[must_use]
pub fn extract_peer_sections(config_text: &str) -> String {
    let mut section = Section::OutsidePeer;
    let mut kept: Vec<&str> = Vec::new();

    for line in config_text.split('\n') {
        section = section.next(line);
        if section == Section::InsidePeer {
            kept.push(line);
        }
    }

    kept.join("\n")
}
