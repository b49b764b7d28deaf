use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};

use super::{Confirmer, OutputContext, TerminalConfirmer};
use crate::api::{
    BigqueryConfig, CreatePeerStatus, Peer, PeerConfig, PeerListItem, PostgresConfig,
    SnowflakeConfig, ValidatePeerStatus,
};
use crate::client::FlowService;
use crate::error::CliError;

#[derive(Args)]
pub struct PeerArgs {
    #[command(subcommand)]
    pub command: PeerCommands,
}

#[derive(Subcommand)]
pub enum PeerCommands {
    /// Create a new peer connection
    Create {
        #[command(flatten)]
        connection: PeerConnectionArgs,
        /// Update the peer if it already exists
        #[arg(long)]
        allow_update: bool,
    },
    /// List all peers
    List,
    /// Validate a peer configuration without creating it
    Validate {
        #[command(flatten)]
        connection: PeerConnectionArgs,
    },
    /// Drop a peer connection
    Drop {
        /// Peer name
        name: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

/// Connection flags shared by `peer create` and `peer validate`.
#[derive(Args)]
pub struct PeerConnectionArgs {
    /// Peer name
    #[arg(long)]
    pub name: String,
    /// Peer type: postgres, bigquery or snowflake
    #[arg(long = "type")]
    pub peer_type: String,

    /// PostgreSQL host
    #[arg(long)]
    pub pg_host: Option<String>,
    /// PostgreSQL port
    #[arg(long, default_value_t = 5432)]
    pub pg_port: u16,
    /// PostgreSQL user
    #[arg(long)]
    pub pg_user: Option<String>,
    /// PostgreSQL password
    #[arg(long)]
    pub pg_password: Option<String>,
    /// PostgreSQL database
    #[arg(long)]
    pub pg_database: Option<String>,
    /// PostgreSQL TLS host override
    #[arg(long)]
    pub pg_tls_host: Option<String>,
    /// PostgreSQL metadata schema
    #[arg(long, default_value = "_peerdb_internal")]
    pub pg_metadata_schema: String,

    /// BigQuery project ID
    #[arg(long)]
    pub bq_project: Option<String>,
    /// BigQuery dataset ID
    #[arg(long)]
    pub bq_dataset: Option<String>,
    /// BigQuery auth type
    #[arg(long, default_value = "service_account")]
    pub bq_auth_type: String,
    /// BigQuery private key
    #[arg(long)]
    pub bq_private_key: Option<String>,
    /// BigQuery private key ID
    #[arg(long)]
    pub bq_private_key_id: Option<String>,
    /// BigQuery client email
    #[arg(long)]
    pub bq_client_email: Option<String>,
    /// BigQuery client ID
    #[arg(long)]
    pub bq_client_id: Option<String>,

    /// Snowflake account ID
    #[arg(long)]
    pub sf_account: Option<String>,
    /// Snowflake username
    #[arg(long)]
    pub sf_user: Option<String>,
    /// Snowflake password
    #[arg(long)]
    pub sf_password: Option<String>,
    /// Snowflake private key
    #[arg(long)]
    pub sf_private_key: Option<String>,
    /// Snowflake database
    #[arg(long)]
    pub sf_database: Option<String>,
    /// Snowflake warehouse
    #[arg(long)]
    pub sf_warehouse: Option<String>,
    /// Snowflake role
    #[arg(long)]
    pub sf_role: Option<String>,
    /// Snowflake metadata schema
    #[arg(long, default_value = "_PEERDB_INTERNAL")]
    pub sf_metadata_schema: String,
}

impl PeerConnectionArgs {
    /// Builds the peer payload from the flags for the declared type.
    pub fn to_peer(&self) -> Result<Peer, CliError> {
        let config = match self.peer_type.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => {
                let config = PostgresConfig {
                    host: self.pg_host.clone().unwrap_or_default(),
                    port: self.pg_port,
                    user: self.pg_user.clone().unwrap_or_default(),
                    password: self.pg_password.clone().unwrap_or_default(),
                    database: self.pg_database.clone().unwrap_or_default(),
                    tls_host: self.pg_tls_host.clone().unwrap_or_default(),
                    metadata_schema: non_empty(&self.pg_metadata_schema),
                };
                config.validate()?;
                PeerConfig::Postgres(config)
            }
            "bigquery" | "bq" => {
                let config = BigqueryConfig {
                    auth_type: self.bq_auth_type.clone(),
                    project_id: self.bq_project.clone().unwrap_or_default(),
                    private_key_id: self.bq_private_key_id.clone().unwrap_or_default(),
                    private_key: self.bq_private_key.clone().unwrap_or_default(),
                    client_email: self.bq_client_email.clone().unwrap_or_default(),
                    client_id: self.bq_client_id.clone().unwrap_or_default(),
                    auth_uri: "https://accounts.google.com/o/oauth2/auth".to_string(),
                    token_uri: "https://oauth2.googleapis.com/token".to_string(),
                    auth_provider_x509_cert_url: "https://www.googleapis.com/oauth2/v1/certs"
                        .to_string(),
                    dataset_id: self.bq_dataset.clone().unwrap_or_default(),
                };
                config.validate()?;
                PeerConfig::Bigquery(config)
            }
            "snowflake" | "sf" => {
                let config = SnowflakeConfig {
                    account_id: self.sf_account.clone().unwrap_or_default(),
                    username: self.sf_user.clone().unwrap_or_default(),
                    password: self.sf_password.clone().filter(|p| !p.is_empty()),
                    private_key: self.sf_private_key.clone().filter(|k| !k.is_empty()),
                    database: self.sf_database.clone().unwrap_or_default(),
                    warehouse: self.sf_warehouse.clone().unwrap_or_default(),
                    role: self.sf_role.clone().unwrap_or_default(),
                    query_timeout: Some(300),
                    metadata_schema: non_empty(&self.sf_metadata_schema),
                };
                config.validate()?;
                PeerConfig::Snowflake(config)
            }
            _ => return Err(CliError::UnsupportedPeerType(self.peer_type.clone())),
        };

        Ok(Peer {
            name: self.name.clone(),
            config,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub async fn execute(
    client: &dyn FlowService,
    args: PeerArgs,
    output: &OutputContext,
) -> Result<()> {
    match args.command {
        PeerCommands::Create {
            connection,
            allow_update,
        } => create_peer(client, &connection, allow_update, output).await,
        PeerCommands::List => list_peers(client, output).await,
        PeerCommands::Validate { connection } => validate_peer(client, &connection, output).await,
        PeerCommands::Drop { name, force } => {
            drop_peer(client, &TerminalConfirmer, &name, force, output).await
        }
    }
}

async fn create_peer(
    client: &dyn FlowService,
    connection: &PeerConnectionArgs,
    allow_update: bool,
    output: &OutputContext,
) -> Result<()> {
    let peer = connection.to_peer()?;
    let response = client.create_peer(peer, allow_update).await?;

    match response.status {
        CreatePeerStatus::Created => {
            output.print_success(&format!("Peer '{}' created", connection.name));
        }
        _ => {
            output.print_error(&format!("Peer '{}' creation failed", connection.name));
        }
    }
    if !response.message.is_empty() {
        println!("  Message: {}", response.message);
    }
    Ok(())
}

async fn list_peers(client: &dyn FlowService, output: &OutputContext) -> Result<()> {
    let response = client.list_peers().await?;

    if output.json {
        output.print_json(&response);
        return Ok(());
    }

    if response.items.is_empty() {
        println!("No peers found");
        return Ok(());
    }

    print_peer_table(&response.items);

    // The service may report dedicated source/destination subsets.
    if !response.source_items.is_empty() && response.source_items.len() != response.items.len() {
        println!("\nSource peers:");
        print_peer_table(&response.source_items);
    }
    if !response.destination_items.is_empty()
        && response.destination_items.len() != response.items.len()
    {
        println!("\nDestination peers:");
        print_peer_table(&response.destination_items);
    }

    Ok(())
}

fn print_peer_table(items: &[PeerListItem]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["NAME", "TYPE"]);
    for item in items {
        table.add_row(vec![item.name.clone(), item.peer_type.clone()]);
    }
    println!("{table}");
}

async fn validate_peer(
    client: &dyn FlowService,
    connection: &PeerConnectionArgs,
    output: &OutputContext,
) -> Result<()> {
    let peer = connection.to_peer()?;
    let response = client.validate_peer(peer).await?;

    match response.status {
        ValidatePeerStatus::Valid => output.print_success("Peer configuration is valid"),
        _ => output.print_error("Peer configuration is invalid"),
    }
    if !response.message.is_empty() {
        println!("  Message: {}", response.message);
    }
    Ok(())
}

async fn drop_peer(
    client: &dyn FlowService,
    confirmer: &dyn Confirmer,
    name: &str,
    force: bool,
    output: &OutputContext,
) -> Result<()> {
    if !force {
        let prompt = format!("Drop peer '{name}'? This action cannot be undone.");
        if !confirmer.confirm(&prompt)? {
            return Err(CliError::ConfirmationDeclined.into());
        }
    }

    client.drop_peer(name).await?;
    output.print_success(&format!("Peer '{name}' dropped"));
    Ok(())
}
