//! Typed model of declarative peer and mirror documents.
//!
//! A document is one YAML file with `apiVersion`, `kind`, `metadata` and a
//! `spec` payload whose shape depends on the kind. The payload is kept as
//! a raw value here and decoded into [`PeerSpec`] or [`MirrorSpec`] by the
//! translator, so an unrecognized `kind` can be reported with the literal
//! value the file carried.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Document kind for peer definitions.
pub const KIND_PEER: &str = "Peer";
/// Document kind for mirror definitions.
pub const KIND_MIRROR: &str = "Mirror";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, rename = "apiVersion")]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: serde_yaml::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `spec` payload of a `Peer` document. The nested `config` stays raw
/// until the declared `type` selects which settings record to decode it
/// into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerSpec {
    #[serde(default, rename = "type")]
    pub peer_type: String,
    #[serde(default)]
    pub config: serde_yaml::Value,
}

/// `spec` payload of a `Mirror` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorSpec {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub tables: Vec<TableMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdc: Option<CdcOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnOptions>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// One entry of a mirror's table list. Duplicate entries are passed
/// through to the service uninspected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableMapping {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub partition_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_columns: Vec<String>,
}

/// Incremental-replication tuning. Absent fields are omitted from the
/// outbound request rather than sent as explicit zeroes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdcOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_snapshot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_slot_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_rows_per_partition: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel_workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_tables_in_parallel: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_delete_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at_column: Option<String>,
}
