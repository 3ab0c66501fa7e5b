//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats. Rendered
//! WireGuard configs are written verbatim in either format by the
//! commands themselves.

use std::io::Write;

use serde::Serialize;
use vpn_peers::PeerView;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Peers for listing. Serializes as a bare JSON array.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct PeerList {
    /// Peers in creation order.
    pub peers: Vec<PeerView>,
}

impl TableDisplay for PeerList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.peers.is_empty() {
            writeln!(writer, "No peers")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<20}  {:<15}  {:<8}  {:<10}  {}",
            "NAME", "ADDRESS", "STATUS", "CREATED", "PUBLIC KEY"
        )?;
        writeln!(writer, "{}", "─".repeat(104))?;

        for peer in &self.peers {
            writeln!(
                writer,
                "{:<20}  {:<15}  {:<8}  {:<10}  {}",
                truncate(&peer.name, 20),
                peer.ip,
                if peer.enabled { "enabled" } else { "disabled" },
                peer.created,
                peer.public_key
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} peer(s)", self.peers.len())?;
        Ok(())
    }
}

/// Result of a state-changing command.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    /// Peer or file the action applied to.
    pub name: String,
    /// Human-readable outcome.
    pub message: String,
}

impl TableDisplay for ActionResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message)?;
        Ok(())
    }
}

/// A freshly created peer with its client config.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedPeer {
    /// Public view of the peer.
    #[serde(flatten)]
    pub peer: PeerView,
    /// Client config text; carries the peer's private key.
    pub client_config: String,
}

impl TableDisplay for AddedPeer {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Added peer '{}' with address {}/32", self.peer.name, self.peer.ip)?;
        writeln!(writer)?;
        write!(writer, "{}", self.client_config)?;
        Ok(())
    }
}

/// A rendered WireGuard config.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigText {
    /// What the config is for: a peer name or the interface name.
    pub name: String,
    /// The config text.
    pub config: String,
}

impl TableDisplay for ConfigText {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write!(writer, "{}", self.config)?;
        Ok(())
    }
}

/// Summary of a data directory after `init`.
#[derive(Debug, Clone, Serialize)]
pub struct InitSummary {
    /// Path of config.json.
    pub config_path: String,
    /// Interface name.
    pub interface: String,
    /// Server address with prefix.
    pub address: String,
    /// Listen port.
    pub listen_port: u16,
    /// Client-facing endpoint, empty if unset.
    pub endpoint: String,
    /// Server public key.
    pub public_key: String,
}

impl TableDisplay for InitSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Initialized {}", self.config_path)?;
        writeln!(writer, "  Interface:   {}", self.interface)?;
        writeln!(writer, "  Address:     {}", self.address)?;
        writeln!(writer, "  Listen port: {}", self.listen_port)?;
        if self.endpoint.is_empty() {
            writeln!(writer, "  Endpoint:    (unset, clients will need one)")?;
        } else {
            writeln!(writer, "  Endpoint:    {}", self.endpoint)?;
        }
        writeln!(writer, "  Public key:  {}", self.public_key)?;
        Ok(())
    }
}

/// Files written by `export` and how to apply them.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    /// Full server config path.
    pub server_config: String,
    /// Peer-only config path.
    pub peers_config: String,
    /// Command that brings the interface up from scratch.
    pub up_command: String,
    /// Command that reloads peers on a running interface.
    pub sync_command: String,
}

impl TableDisplay for ExportSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Wrote {}", self.server_config)?;
        writeln!(writer, "Wrote {}", self.peers_config)?;
        writeln!(writer)?;
        writeln!(writer, "Bring the interface up:")?;
        writeln!(writer, "  {}", self.up_command)?;
        writeln!(writer, "Reload peers on a running interface:")?;
        writeln!(writer, "  {}", self.sync_command)?;
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
