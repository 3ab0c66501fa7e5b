//! Printing and exporting tunnel configs.

use std::io::Write;

use vpn_peers::NetworkManager;

use crate::error::CliError;
use crate::output::{ConfigText, ExportSummary, OutputFormat};

/// Handler for client-config, server-config, peer-config and export.
pub struct RenderCommand<'a> {
    manager: &'a NetworkManager,
}

impl<'a> RenderCommand<'a> {
    /// Creates a new render command handler.
    #[must_use]
    pub const fn new(manager: &'a NetworkManager) -> Self {
        Self { manager }
    }

    /// Prints the config a peer imports on its device.
    ///
    /// # Errors
    ///
    /// Returns error if no such peer exists.
    pub fn client<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        name: &str,
    ) -> Result<(), CliError> {
        let text = ConfigText {
            name: name.to_string(),
            config: self.manager.client_config_for(name)?,
        };
        format.write(out, &text)
    }

    /// Prints the full server config.
    ///
    /// # Errors
    ///
    /// Returns error if the registry cannot be read.
    pub fn server<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let text = ConfigText {
            name: self.manager.config().interface.clone(),
            config: self.manager.server_config()?,
        };
        format.write(out, &text)
    }

    /// Prints the peer sections only.
    ///
    /// # Errors
    ///
    /// Returns error if the registry cannot be read.
    pub fn peers<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let text = ConfigText {
            name: self.manager.config().interface.clone(),
            config: self.manager.peers_config()?,
        };
        format.write(out, &text)
    }

    /// Writes both configs to the data directory and prints how to apply
    /// them.
    ///
    /// # Errors
    ///
    /// Returns error if the registry cannot be read or a file cannot be
    /// written.
    pub fn export<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let files = self.manager.export()?;
        let interface = &self.manager.config().interface;
        let summary = ExportSummary {
            server_config: files.server_config.display().to_string(),
            peers_config: files.peers_config.display().to_string(),
            up_command: format!("wg-quick up {}", files.server_config.display()),
            sync_command: format!("wg syncconf {interface} {}", files.peers_config.display()),
        };
        format.write(out, &summary)
    }
}
