//! Peer lifecycle commands.
//!
//! Changes land in the registry only. The running interface picks them up
//! after `export` and a `wg syncconf`.

use std::io::Write;

use vpn_peers::{NetworkManager, PeerView};

use crate::error::CliError;
use crate::output::{ActionResponse, AddedPeer, OutputFormat, PeerList};

/// Handler for add, remove, list, enable and disable.
pub struct PeerCommand<'a> {
    manager: &'a NetworkManager,
}

impl<'a> PeerCommand<'a> {
    /// Creates a new peer command handler.
    #[must_use]
    pub const fn new(manager: &'a NetworkManager) -> Self {
        Self { manager }
    }

    /// Creates a peer and prints its client config.
    ///
    /// # Errors
    ///
    /// Returns error if the name is taken or the prefix is full.
    pub fn add<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        name: &str,
    ) -> Result<(), CliError> {
        let peer = self.manager.add_peer(name)?;
        let added = AddedPeer {
            peer: PeerView::from(&peer),
            client_config: self.manager.client_config(&peer),
        };
        format.write(out, &added)
    }

    /// Removes a peer.
    ///
    /// # Errors
    ///
    /// Returns error if no such peer exists.
    pub fn remove<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        name: &str,
    ) -> Result<(), CliError> {
        self.manager.remove_peer(name)?;
        let response = ActionResponse {
            name: name.to_string(),
            message: format!("Removed peer '{name}'"),
        };
        format.write(out, &response)
    }

    /// Lists peers without their private keys.
    ///
    /// # Errors
    ///
    /// Returns error if the registry cannot be read.
    pub fn list<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let list = PeerList {
            peers: self.manager.peer_views()?,
        };
        format.write(out, &list)
    }

    /// Enables or disables a peer.
    ///
    /// # Errors
    ///
    /// Returns error if no such peer exists.
    pub fn set_enabled<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        name: &str,
        enabled: bool,
    ) -> Result<(), CliError> {
        self.manager.set_enabled(name, enabled)?;
        let state = if enabled { "Enabled" } else { "Disabled" };
        let response = ActionResponse {
            name: name.to_string(),
            message: format!("{state} peer '{name}'"),
        };
        format.write(out, &response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use vpn_peers::{InitOptions, NetworkConfig, RenderCapabilities};

    fn manager(dir: &std::path::Path) -> NetworkManager {
        NetworkConfig::initialize(dir, InitOptions::default()).expect("init");
        NetworkManager::open(dir, RenderCapabilities::default()).expect("open")
    }

    fn is_enabled(mgr: &NetworkManager, name: &str) -> bool {
        mgr.registry().get_peer(name).expect("peer").enabled
    }

    fn run<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<(), CliError>,
    {
        let mut out = Vec::new();
        f(&mut out).expect("command");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn add_prints_address_and_client_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mgr = manager(dir.path());
        let cmd = PeerCommand::new(&mgr);
        let text = run(|out| cmd.add(out, &OutputFormat::default(), "alice"));
        assert!(text.starts_with("Added peer 'alice' with address 10.0.0.2/32\n"));
        assert!(text.contains("[Interface]\nPrivateKey = "));
        assert!(text.contains("Address = 10.0.0.2/32\n"));
    }

    #[test]
    fn list_json_has_no_private_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mgr = manager(dir.path());
        let cmd = PeerCommand::new(&mgr);
        let alice = mgr.add_peer("alice").expect("alice");
        mgr.add_peer("bob").expect("bob");

        let json = OutputFormat::new(Format::Json);
        let text = run(|out| cmd.list(out, &json));
        let value: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[0]["ip"], "10.0.0.2");
        assert_eq!(value[1]["name"], "bob");
        let secret = alice.private_key.expect("new peers carry a key");
        assert!(!text.contains(&secret));
    }

    #[test]
    fn disable_then_enable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mgr = manager(dir.path());
        let cmd = PeerCommand::new(&mgr);
        mgr.add_peer("alice").expect("alice");
        let format = OutputFormat::default();

        let text = run(|out| cmd.set_enabled(out, &format, "alice", false));
        assert_eq!(text, "Disabled peer 'alice'\n");
        assert!(!is_enabled(&mgr, "alice"));

        run(|out| cmd.set_enabled(out, &format, "alice", true));
        assert!(is_enabled(&mgr, "alice"));
    }

    #[test]
    fn remove_unknown_peer_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mgr = manager(dir.path());
        let err = PeerCommand::new(&mgr)
            .remove(&mut Vec::new(), &OutputFormat::default(), "ghost")
            .expect_err("unknown peer");
        assert!(matches!(
            err,
            CliError::Peers(vpn_peers::Error::NotFound { .. })
        ));
    }
}
