//! Data directory bootstrap.

use std::io::Write;
use std::path::Path;

use vpn_peers::{NetworkConfig, PeerRegistry};

use crate::cli::InitArgs;
use crate::error::CliError;
use crate::output::{InitSummary, OutputFormat};

/// Handler for `init`.
pub struct InitCommand<'a> {
    data_dir: &'a Path,
}

impl<'a> InitCommand<'a> {
    /// Creates a new init command handler.
    #[must_use]
    pub const fn new(data_dir: &'a Path) -> Self {
        Self { data_dir }
    }

    /// Generates the server key pair, writes `config.json` and creates the
    /// peer database.
    ///
    /// # Errors
    ///
    /// Returns error if the directory is already initialized, or if the
    /// config or the database cannot be written.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &InitArgs,
    ) -> Result<(), CliError> {
        let config = NetworkConfig::initialize(self.data_dir, args.clone().into())?;
        PeerRegistry::open_in_dir(self.data_dir)?;
        tracing::info!(
            path = %config.config_path().display(),
            interface = %config.interface,
            "initialized data directory"
        );

        let summary = InitSummary {
            config_path: config.config_path().display().to_string(),
            interface: config.interface.clone(),
            address: config.address.clone(),
            listen_port: config.listen_port,
            endpoint: config.endpoint.clone(),
            public_key: config.public_key.clone(),
        };
        format.write(out, &summary)
    }
}
