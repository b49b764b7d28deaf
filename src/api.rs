//! Wire types of the flow-service contract.
//!
//! The CLI consumes this contract, it does not define it: the structs here
//! mirror the request and response shapes the control plane expects on its
//! JSON API, nothing more.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// A named connection to a data source or destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peer {
    pub name: String,
    #[serde(flatten)]
    pub config: PeerConfig,
}

/// Per-kind connection settings, tagged by database kind on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum PeerConfig {
    Postgres(PostgresConfig),
    Snowflake(SnowflakeConfig),
    Bigquery(BigqueryConfig),
}

impl PeerConfig {
    pub fn type_name(&self) -> &'static str {
        match self {
            PeerConfig::Postgres(_) => "postgres",
            PeerConfig::Snowflake(_) => "snowflake",
            PeerConfig::Bigquery(_) => "bigquery",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostgresConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tls_host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_schema: Option<String>,
}

fn default_postgres_port() -> u16 {
    5432
}

impl PostgresConfig {
    /// Checks the fields the control plane cannot default for us.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() || self.user.is_empty() || self.database.is_empty() {
            return Err(CliError::Validation(
                "postgres peer requires host, user, and database".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub warehouse: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_schema: Option<String>,
}

impl SnowflakeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.account_id.is_empty()
            || self.username.is_empty()
            || self.database.is_empty()
            || self.warehouse.is_empty()
        {
            return Err(CliError::Validation(
                "snowflake peer requires account, username, database, and warehouse".to_string(),
            ));
        }
        if self.password.as_deref().unwrap_or_default().is_empty()
            && self.private_key.as_deref().unwrap_or_default().is_empty()
        {
            return Err(CliError::Validation(
                "snowflake peer requires either password or private key".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BigqueryConfig {
    #[serde(default)]
    pub auth_type: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default)]
    pub auth_uri: String,
    #[serde(default)]
    pub token_uri: String,
    #[serde(default)]
    pub auth_provider_x509_cert_url: String,
    #[serde(default)]
    pub dataset_id: String,
}

impl BigqueryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_empty() || self.dataset_id.is_empty() {
            return Err(CliError::Validation(
                "bigquery peer requires project and dataset".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePeerRequest {
    pub peer: Peer,
    pub allow_update: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatePeerRequest {
    pub peer: Peer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropPeerRequest {
    pub peer_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreatePeerStatus {
    ValidationUnknown,
    Created,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePeerResponse {
    pub status: CreatePeerStatus,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidatePeerStatus {
    CheckUnknown,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatePeerResponse {
    pub status: ValidatePeerStatus,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerListItem {
    pub name: String,
    #[serde(rename = "type", default)]
    pub peer_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPeersResponse {
    #[serde(default)]
    pub items: Vec<PeerListItem>,
    #[serde(default)]
    pub source_items: Vec<PeerListItem>,
    #[serde(default)]
    pub destination_items: Vec<PeerListItem>,
}

/// One source-to-destination table pair of a mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapping {
    pub source_table_identifier: String,
    pub destination_table_identifier: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub partition_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// The flat connection-configuration record a mirror is created from.
/// Optional fields that were not supplied are omitted from the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowConnectionConfigs {
    pub flow_job_name: String,
    pub source_name: String,
    pub destination_name: String,
    pub table_mappings: Vec<TableMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_initial_snapshot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_slot_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_num_rows_per_partition: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_max_parallel_workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_num_tables_in_parallel: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_delete_col_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at_col_name: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMirrorRequest {
    pub connection_configs: FlowConnectionConfigs,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMirrorResponse {
    #[serde(default)]
    pub workflow_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorListItem {
    pub name: String,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub destination_name: String,
    #[serde(default)]
    pub is_cdc: bool,
    /// Creation time as Unix seconds.
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMirrorsResponse {
    #[serde(default)]
    pub mirrors: Vec<MirrorListItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorStatusRequest {
    pub flow_job_name: String,
    pub include_flow_info: bool,
    pub exclude_batches: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowState {
    StatusUnknown,
    StatusSetup,
    StatusSnapshot,
    StatusRunning,
    StatusPaused,
    StatusTerminated,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowState::StatusSetup => "SETUP",
            FlowState::StatusSnapshot => "SNAPSHOT",
            FlowState::StatusRunning => "RUNNING",
            FlowState::StatusPaused => "PAUSED",
            FlowState::StatusTerminated => "TERMINATED",
            FlowState::StatusUnknown => "UNKNOWN",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorStatusResponse {
    pub flow_job_name: String,
    pub current_flow_state: FlowState,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cdc_status: Option<CdcStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdcStatus {
    #[serde(default)]
    pub rows_synced: i64,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub destination_type: String,
    #[serde(default)]
    pub cdc_batches: Vec<CdcBatch>,
    #[serde(default)]
    pub snapshot_status: Option<SnapshotStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdcBatch {
    #[serde(default)]
    pub batch_id: i64,
    #[serde(default)]
    pub num_rows: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotStatus {
    #[serde(default)]
    pub clones: Vec<TableCloneStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableCloneStatus {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub num_rows_synced: i64,
}

/// Request to move a mirror between states, optionally carrying a
/// configuration update to apply while paused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowStateChangeRequest {
    pub flow_job_name: String,
    pub requested_flow_state: FlowState,
    #[serde(default)]
    pub drop_mirror_stats: bool,
    #[serde(default)]
    pub skip_destination_drop: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_config_update: Option<FlowConfigUpdate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowConfigUpdate {
    pub cdc_flow_config_update: CdcFlowConfigUpdate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdcFlowConfigUpdate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_tables: Vec<TableMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_tables: Vec<TableMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<u64>,
}
