//! CLI command implementations.
//!
//! Each submodule implements a group of CLI commands:
//! - [`init`] - Data directory bootstrap
//! - [`peer`] - Peer lifecycle
//! - [`render`] - Printing and exporting tunnel configs

pub mod init;
pub mod peer;
pub mod render;

pub use init::InitCommand;
pub use peer::PeerCommand;
pub use render::RenderCommand;
