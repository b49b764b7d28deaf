use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};

use super::{Confirmer, OutputContext, TerminalConfirmer};
use crate::api::{
    CdcFlowConfigUpdate, CreateMirrorRequest, FlowConfigUpdate, FlowConnectionConfigs,
    TableMapping,
};
use crate::client::FlowService;
use crate::error::CliError;

#[derive(Args)]
pub struct MirrorArgs {
    #[command(subcommand)]
    pub command: MirrorCommands,
}

#[derive(Subcommand)]
pub enum MirrorCommands {
    /// Create a new CDC mirror between two peers
    Create(CreateArgs),
    /// List all mirrors
    List,
    /// Show detailed status for a mirror
    Status {
        /// Mirror name
        name: String,
    },
    /// Pause a running mirror
    Pause {
        /// Mirror name
        name: String,
    },
    /// Resume a paused mirror
    Resume {
        /// Mirror name
        name: String,
    },
    /// Update the configuration of an existing mirror
    Edit(EditArgs),
    /// Terminate and drop a mirror
    Drop {
        /// Mirror name
        name: String,
        /// Leave the destination tables in place
        #[arg(long)]
        skip_destination_drop: bool,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    /// Mirror name
    #[arg(long)]
    pub name: String,
    /// Source peer name
    #[arg(long)]
    pub source: String,
    /// Destination peer name
    #[arg(long)]
    pub destination: String,
    /// Table mappings in the form 'source_table->dest_table'
    #[arg(long, value_delimiter = ',', required = true)]
    pub tables: Vec<String>,
    /// Maximum batch size
    #[arg(long, default_value_t = 1000)]
    pub batch_size: u32,
    /// Idle timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub idle_timeout: u64,
    /// Perform an initial full copy before incremental replication
    #[arg(long, default_value_t = true, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub initial_snapshot: bool,
    /// PostgreSQL publication name
    #[arg(long)]
    pub publication: Option<String>,
    /// PostgreSQL replication slot name
    #[arg(long)]
    pub replication_slot: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Mirror name
    pub name: String,
    /// Table mappings to add, in the form 'source_table->dest_table'
    #[arg(long, value_delimiter = ',')]
    pub add_tables: Vec<String>,
    /// Table mappings to remove, in the form 'source_table->dest_table'
    #[arg(long, value_delimiter = ',')]
    pub remove_tables: Vec<String>,
    /// New maximum batch size
    #[arg(long)]
    pub batch_size: Option<u32>,
    /// New idle timeout in seconds
    #[arg(long)]
    pub idle_timeout: Option<u64>,
}

pub async fn execute(
    client: &dyn FlowService,
    args: MirrorArgs,
    output: &OutputContext,
) -> Result<()> {
    match args.command {
        MirrorCommands::Create(args) => create_mirror(client, args, output).await,
        MirrorCommands::List => list_mirrors(client, output).await,
        MirrorCommands::Status { name } => mirror_status(client, &name, output).await,
        MirrorCommands::Pause { name } => {
            client.pause_mirror(&name).await?;
            output.print_success(&format!("Mirror '{name}' paused"));
            Ok(())
        }
        MirrorCommands::Resume { name } => {
            client.resume_mirror(&name).await?;
            output.print_success(&format!("Mirror '{name}' resumed"));
            Ok(())
        }
        MirrorCommands::Edit(args) => edit_mirror(client, args, output).await,
        MirrorCommands::Drop {
            name,
            skip_destination_drop,
            force,
        } => {
            drop_mirror(
                client,
                &TerminalConfirmer,
                &name,
                skip_destination_drop,
                force,
                output,
            )
            .await
        }
    }
}

/// Parses one `source->destination` mapping from the command line.
fn parse_table_mapping(raw: &str) -> Result<TableMapping, CliError> {
    let parts: Vec<&str> = raw.split("->").collect();
    if parts.len() != 2 {
        return Err(CliError::Validation(format!(
            "invalid table mapping '{raw}' (expected 'source->destination')"
        )));
    }
    let source = parts[0].trim();
    let destination = parts[1].trim();
    if source.is_empty() || destination.is_empty() {
        return Err(CliError::Validation(format!(
            "invalid table mapping '{raw}' (expected 'source->destination')"
        )));
    }
    Ok(TableMapping {
        source_table_identifier: source.to_string(),
        destination_table_identifier: destination.to_string(),
        ..Default::default()
    })
}

fn parse_table_mappings(raw: &[String]) -> Result<Vec<TableMapping>, CliError> {
    raw.iter().map(|entry| parse_table_mapping(entry)).collect()
}

async fn create_mirror(
    client: &dyn FlowService,
    args: CreateArgs,
    output: &OutputContext,
) -> Result<()> {
    let table_mappings = parse_table_mappings(&args.tables)?;
    let table_count = table_mappings.len();

    let request = CreateMirrorRequest {
        connection_configs: FlowConnectionConfigs {
            flow_job_name: args.name.clone(),
            source_name: args.source.clone(),
            destination_name: args.destination.clone(),
            table_mappings,
            max_batch_size: Some(args.batch_size),
            idle_timeout_seconds: Some(args.idle_timeout),
            do_initial_snapshot: Some(args.initial_snapshot),
            publication_name: args.publication.clone(),
            replication_slot_name: args.replication_slot.clone(),
            ..Default::default()
        },
    };

    let response = client.create_mirror(request).await?;

    output.print_success(&format!("Mirror '{}' created", args.name));
    println!("  Workflow ID: {}", response.workflow_id);
    println!("  Source: {}", args.source);
    println!("  Destination: {}", args.destination);
    println!("  Tables: {table_count}");
    Ok(())
}

async fn list_mirrors(client: &dyn FlowService, output: &OutputContext) -> Result<()> {
    let response = client.list_mirrors().await?;

    if output.json {
        output.print_json(&response);
        return Ok(());
    }

    if response.mirrors.is_empty() {
        println!("No mirrors found");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["NAME", "SOURCE", "DESTINATION", "TYPE", "CREATED"]);
    for mirror in &response.mirrors {
        let mirror_type = if mirror.is_cdc { "CDC" } else { "QRep" };
        let created = chrono::DateTime::from_timestamp(mirror.created_at, 0)
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            mirror.name.clone(),
            mirror.source_name.clone(),
            mirror.destination_name.clone(),
            mirror_type.to_string(),
            created,
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn mirror_status(client: &dyn FlowService, name: &str, output: &OutputContext) -> Result<()> {
    let response = client.mirror_status(name).await?;

    if output.json {
        output.print_json(&response);
        return Ok(());
    }

    println!("Mirror: {}", response.flow_job_name);
    println!("Status: {}", response.current_flow_state);
    if let Some(created_at) = response.created_at {
        println!("Created: {}", created_at.to_rfc3339());
    }
    if let Some(cdc) = &response.cdc_status {
        println!("Rows synced: {}", cdc.rows_synced);
        println!("Source type: {}", cdc.source_type);
        println!("Destination type: {}", cdc.destination_type);
        if let Some(snapshot) = &cdc.snapshot_status {
            println!("Snapshot tables: {}", snapshot.clones.len());
        }
        println!("CDC batches: {}", cdc.cdc_batches.len());
    }
    Ok(())
}

async fn edit_mirror(
    client: &dyn FlowService,
    args: EditArgs,
    output: &OutputContext,
) -> Result<()> {
    let update = FlowConfigUpdate {
        cdc_flow_config_update: CdcFlowConfigUpdate {
            additional_tables: parse_table_mappings(&args.add_tables)?,
            removed_tables: parse_table_mappings(&args.remove_tables)?,
            batch_size: args.batch_size,
            idle_timeout: args.idle_timeout,
        },
    };

    client.update_mirror(&args.name, update).await?;
    output.print_success(&format!("Mirror '{}' updated", args.name));
    Ok(())
}

async fn drop_mirror(
    client: &dyn FlowService,
    confirmer: &dyn Confirmer,
    name: &str,
    skip_destination_drop: bool,
    force: bool,
    output: &OutputContext,
) -> Result<()> {
    if !force {
        let prompt = format!("Drop mirror '{name}'? This action cannot be undone.");
        if !confirmer.confirm(&prompt)? {
            return Err(CliError::ConfirmationDeclined.into());
        }
    }

    client.drop_mirror(name, skip_destination_drop).await?;
    output.print_success(&format!("Mirror '{name}' dropped"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_table_mapping;

    #[test]
    fn parses_source_and_destination() {
        let mapping = parse_table_mapping("public.users -> analytics.users").unwrap();
        assert_eq!(mapping.source_table_identifier, "public.users");
        assert_eq!(mapping.destination_table_identifier, "analytics.users");
    }

    #[test]
    fn rejects_missing_arrow() {
        assert!(parse_table_mapping("public.users").is_err());
    }

    #[test]
    fn rejects_extra_arrow() {
        assert!(parse_table_mapping("a->b->c").is_err());
    }

    #[test]
    fn rejects_empty_side() {
        assert!(parse_table_mapping("->analytics.users").is_err());
    }
}
