//! Converts declarative documents into flow-service requests.
//!
//! Translation is pure: it never touches the network or the filesystem.
//! The nested peer `config` is decoded directly into the per-kind settings
//! record selected by the declared `type`, so a typo in the type string
//! surfaces with the literal value the document carried.

use crate::api;
use crate::document::{Document, MirrorSpec, PeerSpec, KIND_MIRROR, KIND_PEER};
use crate::error::{CliError, Result};

/// A creation request ready to submit to the flow service.
#[derive(Debug, Clone)]
pub enum Request {
    CreatePeer(api::Peer),
    CreateMirror(api::CreateMirrorRequest),
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::CreatePeer(_) => KIND_PEER,
            Request::CreateMirror(_) => KIND_MIRROR,
        }
    }
}

pub fn translate(document: &Document) -> Result<Request> {
    match document.kind.as_str() {
        KIND_PEER => peer_request(document).map(Request::CreatePeer),
        KIND_MIRROR => mirror_request(document).map(Request::CreateMirror),
        other => Err(CliError::UnsupportedKind(other.to_string())),
    }
}

/// Builds the peer-creation payload from a `Peer` document.
pub fn peer_request(document: &Document) -> Result<api::Peer> {
    if document.kind != KIND_PEER {
        return Err(CliError::UnsupportedKind(document.kind.clone()));
    }
    if document.metadata.name.is_empty() {
        return Err(CliError::Validation(
            "metadata.name must not be empty".to_string(),
        ));
    }

    let spec: PeerSpec = serde_yaml::from_value(document.spec.clone())
        .map_err(|e| CliError::Validation(format!("invalid peer spec: {e}")))?;

    let config = match spec.peer_type.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => {
            let config: api::PostgresConfig = decode_peer_config(spec.config)?;
            config.validate()?;
            api::PeerConfig::Postgres(config)
        }
        "snowflake" | "sf" => {
            let config: api::SnowflakeConfig = decode_peer_config(spec.config)?;
            config.validate()?;
            api::PeerConfig::Snowflake(config)
        }
        _ => return Err(CliError::UnsupportedPeerType(spec.peer_type)),
    };

    Ok(api::Peer {
        name: document.metadata.name.clone(),
        config,
    })
}

fn decode_peer_config<T: serde::de::DeserializeOwned>(config: serde_yaml::Value) -> Result<T> {
    serde_yaml::from_value(config)
        .map_err(|e| CliError::Validation(format!("invalid peer config: {e}")))
}

/// Builds the mirror-creation payload from a `Mirror` document. Table
/// entries are copied verbatim, in document order; optional CDC, snapshot
/// and column sub-records merge into the flat request, omitted when
/// absent.
pub fn mirror_request(document: &Document) -> Result<api::CreateMirrorRequest> {
    if document.kind != KIND_MIRROR {
        return Err(CliError::UnsupportedKind(document.kind.clone()));
    }
    if document.metadata.name.is_empty() {
        return Err(CliError::Validation(
            "metadata.name must not be empty".to_string(),
        ));
    }

    let spec: MirrorSpec = serde_yaml::from_value(document.spec.clone())
        .map_err(|e| CliError::Validation(format!("invalid mirror spec: {e}")))?;

    if spec.source.is_empty() {
        return Err(CliError::Validation(
            "spec.source must not be empty".to_string(),
        ));
    }
    if spec.destination.is_empty() {
        return Err(CliError::Validation(
            "spec.destination must not be empty".to_string(),
        ));
    }

    let mut table_mappings = Vec::with_capacity(spec.tables.len());
    for (index, table) in spec.tables.iter().enumerate() {
        if table.source.is_empty() {
            return Err(CliError::Validation(format!(
                "spec.tables[{index}].source must not be empty"
            )));
        }
        if table.destination.is_empty() {
            return Err(CliError::Validation(format!(
                "spec.tables[{index}].destination must not be empty"
            )));
        }
        table_mappings.push(api::TableMapping {
            source_table_identifier: table.source.clone(),
            destination_table_identifier: table.destination.clone(),
            partition_key: table.partition_key.clone(),
            exclude: table.exclude_columns.clone(),
        });
    }

    let mut configs = api::FlowConnectionConfigs {
        flow_job_name: document.metadata.name.clone(),
        source_name: spec.source.clone(),
        destination_name: spec.destination.clone(),
        table_mappings,
        env: spec.env.clone(),
        ..Default::default()
    };

    if let Some(cdc) = &spec.cdc {
        configs.max_batch_size = cdc.batch_size;
        configs.idle_timeout_seconds = cdc.idle_timeout_seconds;
        configs.do_initial_snapshot = cdc.initial_snapshot;
        configs.publication_name = cdc.publication_name.clone();
        configs.replication_slot_name = cdc.replication_slot_name.clone();
    }
    if let Some(snapshot) = &spec.snapshot {
        configs.snapshot_num_rows_per_partition = snapshot.num_rows_per_partition;
        configs.snapshot_max_parallel_workers = snapshot.max_parallel_workers;
        configs.snapshot_num_tables_in_parallel = snapshot.num_tables_in_parallel;
    }
    if let Some(columns) = &spec.columns {
        configs.soft_delete_col_name = columns.soft_delete_column.clone();
        configs.synced_at_col_name = columns.synced_at_column.clone();
    }

    Ok(api::CreateMirrorRequest {
        connection_configs: configs,
    })
}
