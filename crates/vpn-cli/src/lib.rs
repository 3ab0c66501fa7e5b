//! # vpn-cli
//!
//! Command-line interface for a single-host WireGuard overlay.
//!
//! Provides commands for:
//! - Bootstrapping a data directory with server keys
//! - Adding, removing, enabling and disabling peers
//! - Printing server, client and peer-only configs
//! - Exporting the configs `wg-quick` and `wg syncconf` read
//!
//! Every command works against the files in the data directory; nothing
//! here touches the network interface. Applying a config is left to the
//! operator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::OutputFormat;
