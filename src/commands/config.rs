use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::OutputContext;
use crate::api::PostgresConfig;
use crate::apply::{self, ApplyOptions};
use crate::client::FlowService;
use crate::document::{
    CdcOptions, Document, Metadata, MirrorSpec, PeerSpec, TableMapping, KIND_MIRROR, KIND_PEER,
};
use crate::loader;
use crate::settings::{Overrides, Settings};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the resolved settings
    Show,
    /// Set settings values and persist them
    Set(SetArgs),
    /// Write a settings file with default values
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
    /// Validate declarative configuration file(s) without applying them
    Validate {
        /// Configuration file or directory path
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Apply peer and mirror configurations from YAML file(s)
    Apply {
        /// Configuration file or directory path
        #[arg(short, long)]
        file: PathBuf,
        /// Show what would be applied without applying it
        #[arg(long)]
        dry_run: bool,
        /// Allow updating peers that already exist
        #[arg(long)]
        force: bool,
    },
    /// Write a template peer document
    ExportPeer {
        /// Peer name
        name: String,
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Environment to set in metadata
        #[arg(long, default_value = "production")]
        environment: String,
    },
    /// Write a template mirror document
    ExportMirror {
        /// Mirror name
        name: String,
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Environment to set in metadata
        #[arg(long, default_value = "production")]
        environment: String,
    },
}

#[derive(Args)]
pub struct SetArgs {
    /// Flow-service host
    #[arg(long)]
    pub host: Option<String>,
    /// Flow-service port
    #[arg(long)]
    pub port: Option<u16>,
    /// Connect over TLS
    #[arg(long)]
    pub tls: Option<bool>,
    /// Username for authentication
    #[arg(long)]
    pub username: Option<String>,
    /// Password for authentication
    #[arg(long)]
    pub password: Option<String>,
}

pub async fn execute(
    client: &dyn FlowService,
    args: ConfigArgs,
    settings: &Settings,
    settings_file: Option<&Path>,
    output: &OutputContext,
) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_settings(settings, output),
        ConfigCommands::Set(args) => set_settings(args, settings_file, output),
        ConfigCommands::Init { force } => init_settings(force, output),
        ConfigCommands::Validate { file } => validate_documents(&file, output),
        ConfigCommands::Apply {
            file,
            dry_run,
            force,
        } => apply_documents(client, &file, dry_run, force, output).await,
        ConfigCommands::ExportPeer {
            name,
            output: path,
            environment,
        } => export_peer(&name, path, &environment, output),
        ConfigCommands::ExportMirror {
            name,
            output: path,
            environment,
        } => export_mirror(&name, path, &environment, output),
    }
}

fn show_settings(settings: &Settings, output: &OutputContext) -> Result<()> {
    if output.json {
        output.print_json(settings);
        return Ok(());
    }

    println!("Current settings:");
    println!("  Host:     {}", settings.peerdb_host);
    println!("  Port:     {}", settings.peerdb_port);
    println!("  TLS:      {}", settings.tls);
    println!("  Username: {}", settings.username);
    println!("  Address:  {}", settings.address());
    if settings.password.is_empty() {
        println!("  Password: [not set]");
    } else {
        println!("  Password: [set]");
    }
    Ok(())
}

fn set_settings(args: SetArgs, settings_file: Option<&Path>, output: &OutputContext) -> Result<()> {
    // Start from file + environment state, not from flag-merged state, so
    // a one-off connection override does not end up persisted.
    let mut settings = Settings::load(settings_file, &Overrides::default())?;

    if let Some(host) = args.host {
        println!("Set host to: {host}");
        settings.peerdb_host = host;
    }
    if let Some(port) = args.port {
        println!("Set port to: {port}");
        settings.peerdb_port = port;
    }
    if let Some(tls) = args.tls {
        println!("Set TLS to: {tls}");
        settings.tls = tls;
    }
    if let Some(username) = args.username {
        println!("Set username to: {username}");
        settings.username = username;
    }
    if let Some(password) = args.password {
        println!("Set password: [hidden]");
        settings.password = password;
    }

    settings.save()?;
    output.print_success("Settings saved");
    Ok(())
}

fn init_settings(force: bool, output: &OutputContext) -> Result<()> {
    let path = Settings::user_settings_path();

    if path.exists() && !force {
        println!(
            "Settings file already exists at {}. Use --force to overwrite.",
            path.display()
        );
        return Ok(());
    }

    let settings = Settings::default();
    settings.save()?;

    output.print_success("Settings initialized with default values");
    println!("  Saved to: {}", path.display());
    println!("  Default host: {}", settings.peerdb_host);
    println!("  Default port: {}", settings.peerdb_port);
    Ok(())
}

fn validate_documents(file: &Path, output: &OutputContext) -> Result<()> {
    let documents = loader::load_path(file)?;
    if documents.is_empty() {
        println!("No configuration documents found");
        return Ok(());
    }

    let outcomes = apply::validate_documents(&documents);
    let mut failures = 0;
    for outcome in &outcomes {
        match &outcome.error {
            None => println!(
                "{} {} '{}' is valid",
                "✓".green(),
                outcome.kind,
                outcome.name
            ),
            Some(err) => {
                failures += 1;
                println!(
                    "{} {} '{}' ({}): {err}",
                    "✗".red(),
                    outcome.kind,
                    outcome.name,
                    outcome.path.display()
                );
            }
        }
    }

    println!();
    if failures > 0 {
        anyhow::bail!("{failures} of {} document(s) failed validation", outcomes.len());
    }
    output.print_success(&format!("All {} document(s) are valid", outcomes.len()));
    Ok(())
}

async fn apply_documents(
    client: &dyn FlowService,
    file: &Path,
    dry_run: bool,
    force: bool,
    output: &OutputContext,
) -> Result<()> {
    let documents = loader::load_path(file)?;
    if documents.is_empty() {
        println!("No configuration documents found");
        return Ok(());
    }

    let options = ApplyOptions { dry_run, force };
    let applied = apply::apply_documents(client, &documents, &options).await?;

    if dry_run {
        println!("\n[dry-run] {} document(s) would be applied", documents.len());
    } else {
        output.print_success(&format!("Applied {applied} document(s)"));
    }
    Ok(())
}

fn export_peer(
    name: &str,
    path: Option<PathBuf>,
    environment: &str,
    output: &OutputContext,
) -> Result<()> {
    let path = path
        .unwrap_or_else(|| PathBuf::from(format!("configs/peers/{environment}/{name}.yaml")));

    let config = PostgresConfig {
        host: "localhost".to_string(),
        port: 5432,
        user: "postgres".to_string(),
        password: "${POSTGRES_PASSWORD}".to_string(),
        database: "mydb".to_string(),
        ..Default::default()
    };
    let document = Document {
        api_version: "v1".to_string(),
        kind: KIND_PEER.to_string(),
        metadata: Metadata {
            name: name.to_string(),
            environment: Some(environment.to_string()),
            description: Some(format!("Connection settings for the {name} peer")),
        },
        spec: serde_yaml::to_value(PeerSpec {
            peer_type: "postgres".to_string(),
            config: serde_yaml::to_value(config)?,
        })?,
    };

    write_document(&document, &path)?;
    output.print_success(&format!("Peer template written to {}", path.display()));
    println!("  Update the template with real values before applying");
    Ok(())
}

fn export_mirror(
    name: &str,
    path: Option<PathBuf>,
    environment: &str,
    output: &OutputContext,
) -> Result<()> {
    let path = path
        .unwrap_or_else(|| PathBuf::from(format!("configs/mirrors/{environment}/{name}.yaml")));

    let spec = MirrorSpec {
        source: "postgres_source".to_string(),
        destination: "snowflake_warehouse".to_string(),
        tables: vec![TableMapping {
            source: "public.example_table".to_string(),
            destination: "ANALYTICS_DB.PUBLIC.EXAMPLE_TABLE".to_string(),
            ..Default::default()
        }],
        cdc: Some(CdcOptions {
            batch_size: Some(1000),
            idle_timeout_seconds: Some(60),
            initial_snapshot: Some(true),
            publication_name: Some("peerdb_pub".to_string()),
            replication_slot_name: Some("peerdb_slot".to_string()),
        }),
        ..Default::default()
    };
    let document = Document {
        api_version: "v1".to_string(),
        kind: KIND_MIRROR.to_string(),
        metadata: Metadata {
            name: name.to_string(),
            environment: Some(environment.to_string()),
            description: Some(format!("Replication pipeline for the {name} mirror")),
        },
        spec: serde_yaml::to_value(spec)?,
    };

    write_document(&document, &path)?;
    output.print_success(&format!("Mirror template written to {}", path.display()));
    println!("  Update the template with real values before applying");
    Ok(())
}

fn write_document(document: &Document, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let text = serde_yaml::to_string(document)?;
    fs::write(path, text)?;
    Ok(())
}
