//! `vpn` binary entrypoint.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vpn_cli::cli::{Cli, Commands};
use vpn_cli::commands::{InitCommand, PeerCommand, RenderCommand};
use vpn_cli::output::OutputFormat;
use vpn_cli::CliError;
use vpn_peers::{NetworkManager, RenderCapabilities};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf, CliError> {
    flag.or_else(vpn_peers::default_data_dir).ok_or_else(|| {
        CliError::Config("no data directory: pass --data-dir or set VPN_DATA_DIR".into())
    })
}

fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let data_dir = resolve_data_dir(cli.data_dir)?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Init(args) => InitCommand::new(&data_dir).execute(&mut stdout, &format, &args),
        command => {
            let manager = NetworkManager::open(&data_dir, RenderCapabilities::host())?;
            dispatch(&manager, &mut stdout, &format, command)
        }
    }
}

fn dispatch<W: io::Write>(
    manager: &NetworkManager,
    out: &mut W,
    format: &OutputFormat,
    command: Commands,
) -> Result<(), CliError> {
    let peers = PeerCommand::new(manager);
    let render = RenderCommand::new(manager);

    match command {
        Commands::Add { name } => peers.add(out, format, &name),
        Commands::Remove { name } => peers.remove(out, format, &name),
        Commands::List => peers.list(out, format),
        Commands::Enable { name } => peers.set_enabled(out, format, &name, true),
        Commands::Disable { name } => peers.set_enabled(out, format, &name, false),
        Commands::ClientConfig { name } => render.client(out, format, &name),
        Commands::ServerConfig => render.server(out, format),
        Commands::PeerConfig => render.peers(out, format),
        Commands::Export => render.export(out, format),
        Commands::Init(_) => Err(CliError::Config("init must run before the registry is opened".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpn_cli::cli::Format;

    #[test]
    fn cli_parses_add() {
        let cli = Cli::parse_from(["vpn", "add", "alice"]);
        assert!(matches!(cli.command, Commands::Add { name } if name == "alice"));
    }

    #[test]
    fn cli_accepts_short_aliases() {
        let cli = Cli::parse_from(["vpn", "rm", "alice"]);
        assert!(matches!(cli.command, Commands::Remove { .. }));
        let cli = Cli::parse_from(["vpn", "ls"]);
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn cli_respects_format_flag() {
        let cli = Cli::parse_from(["vpn", "--format", "json", "list"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn cli_parses_init_defaults() {
        let cli = Cli::parse_from(["vpn", "init", "--endpoint", "vpn.example.com"]);
        match cli.command {
            Commands::Init(args) => {
                assert_eq!(args.endpoint.as_deref(), Some("vpn.example.com"));
                assert_eq!(args.interface, "wg0");
                assert_eq!(args.listen_port, 51820);
                assert_eq!(args.address, "10.0.0.1/24");
            }
            _ => panic!("expected init command"),
        }
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = resolve_data_dir(Some(PathBuf::from("/srv/vpn"))).expect("dir");
        assert_eq!(dir, PathBuf::from("/srv/vpn"));
    }

    #[test]
    fn run_without_init_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cli = Cli::parse_from([
            "vpn",
            "--data-dir",
            dir.path().to_str().expect("utf8 path"),
            "list",
        ]);
        assert!(matches!(
            run(cli),
            Err(CliError::Peers(vpn_peers::Error::NotInitialized { .. }))
        ));
    }
}
