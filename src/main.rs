use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mirrorctl::client::FlowClient;
use mirrorctl::commands::{config as config_cmd, mirror, peer, OutputContext};
use mirrorctl::settings::{Overrides, Settings};

/// Command-line interface for managing PeerDB mirrors and peers.
#[derive(Parser)]
#[command(name = "mirrorctl", version, about, long_about = None)]
struct Cli {
    /// Path to the settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Flow-service host
    #[arg(long)]
    host: Option<String>,

    /// Flow-service port
    #[arg(long)]
    port: Option<u16>,

    /// Connect over TLS
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    tls: Option<bool>,

    /// Username for authentication
    #[arg(long)]
    username: Option<String>,

    /// Password for authentication
    #[arg(long)]
    password: Option<String>,

    /// Output responses as JSON
    #[arg(long)]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage CLI settings and declarative configuration files
    Config(config_cmd::ConfigArgs),
    /// Manage peer connections
    Peer(peer::PeerArgs),
    /// Manage replication mirrors
    Mirror(mirror::MirrorArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let overrides = Overrides {
        host: cli.host,
        port: cli.port,
        tls: cli.tls,
        username: cli.username,
        password: cli.password,
    };
    let settings = Settings::load(cli.config.as_deref(), &overrides)?;
    let client = FlowClient::new(&settings)?;
    let output = OutputContext { json: cli.json };

    match cli.command {
        Commands::Config(args) => {
            config_cmd::execute(&client, args, &settings, cli.config.as_deref(), &output).await
        }
        Commands::Peer(args) => peer::execute(&client, args, &output).await,
        Commands::Mirror(args) => mirror::execute(&client, args, &output).await,
    }
}
