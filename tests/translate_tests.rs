//! Translator: lossless field mapping, kind dispatch and validation.

use mirrorctl::api::PeerConfig;
use mirrorctl::document::Document;
use mirrorctl::error::CliError;
use mirrorctl::translate::{translate, Request};

fn document(text: &str) -> Document {
    serde_yaml::from_str(text).unwrap()
}

#[test]
fn postgres_peer_translates_losslessly() {
    let doc = document(
        r#"
apiVersion: v1
kind: Peer
metadata:
  name: pg-main
spec:
  type: postgres
  config:
    host: db.internal
    port: 5433
    user: replicator
    password: secret
    database: appdb
    tls_host: db.tls.internal
    metadata_schema: _peerdb_internal
"#,
    );

    let request = translate(&doc).unwrap();
    let Request::CreatePeer(peer) = request else {
        panic!("expected a peer request");
    };
    assert_eq!(peer.name, "pg-main");
    let PeerConfig::Postgres(config) = peer.config else {
        panic!("expected a postgres config");
    };
    assert_eq!(config.host, "db.internal");
    assert_eq!(config.port, 5433);
    assert_eq!(config.user, "replicator");
    assert_eq!(config.password, "secret");
    assert_eq!(config.database, "appdb");
    assert_eq!(config.tls_host, "db.tls.internal");
    assert_eq!(config.metadata_schema.as_deref(), Some("_peerdb_internal"));
}

#[test]
fn peer_type_matching_is_case_insensitive_with_aliases() {
    for type_name in ["PostgreSQL", "POSTGRES", "postgresql"] {
        let doc = document(&format!(
            r#"
kind: Peer
metadata:
  name: pg-alias
spec:
  type: {type_name}
  config:
    host: db.internal
    user: replicator
    database: appdb
"#
        ));
        let request = translate(&doc).unwrap();
        let Request::CreatePeer(peer) = request else {
            panic!("expected a peer request");
        };
        assert!(matches!(peer.config, PeerConfig::Postgres(_)));
    }
}

#[test]
fn snowflake_peer_translates() {
    let doc = document(
        r#"
kind: Peer
metadata:
  name: sf-warehouse
spec:
  type: snowflake
  config:
    account_id: xy12345
    username: LOADER
    private_key: dGVzdA==
    database: ANALYTICS
    warehouse: LOAD_WH
    role: SYSADMIN
    query_timeout: 120
"#,
    );

    let Request::CreatePeer(peer) = translate(&doc).unwrap() else {
        panic!("expected a peer request");
    };
    let PeerConfig::Snowflake(config) = peer.config else {
        panic!("expected a snowflake config");
    };
    assert_eq!(config.account_id, "xy12345");
    assert_eq!(config.username, "LOADER");
    assert_eq!(config.private_key.as_deref(), Some("dGVzdA=="));
    assert_eq!(config.password, None);
    assert_eq!(config.database, "ANALYTICS");
    assert_eq!(config.warehouse, "LOAD_WH");
    assert_eq!(config.role, "SYSADMIN");
    assert_eq!(config.query_timeout, Some(120));
}

#[test]
fn snowflake_peer_requires_credentials() {
    let doc = document(
        r#"
kind: Peer
metadata:
  name: sf-warehouse
spec:
  type: snowflake
  config:
    account_id: xy12345
    username: LOADER
    database: ANALYTICS
    warehouse: LOAD_WH
"#,
    );

    let err = translate(&doc).unwrap_err();
    assert!(matches!(err, CliError::Validation(_)));
    assert!(err.to_string().contains("password or private key"));
}

#[test]
fn unrecognized_kind_fails_naming_the_literal_value() {
    let doc = document("kind: Gadget\nmetadata:\n  name: what\n");
    let err = translate(&doc).unwrap_err();
    assert!(matches!(err, CliError::UnsupportedKind(_)));
    assert!(err.to_string().contains("Gadget"));
}

#[test]
fn unrecognized_peer_type_fails_naming_the_literal_value() {
    let doc = document(
        "kind: Peer\nmetadata:\n  name: maria\nspec:\n  type: MariaDB\n  config: {}\n",
    );
    let err = translate(&doc).unwrap_err();
    assert!(matches!(err, CliError::UnsupportedPeerType(_)));
    assert!(err.to_string().contains("MariaDB"));
}

#[test]
fn missing_postgres_fields_fail_validation() {
    let doc = document(
        r#"
kind: Peer
metadata:
  name: pg-main
spec:
  type: postgres
  config:
    host: db.internal
"#,
    );
    let err = translate(&doc).unwrap_err();
    assert!(matches!(err, CliError::Validation(_)));
    assert!(err.to_string().contains("user"));
}

#[test]
fn empty_metadata_name_fails_validation() {
    let doc = document("kind: Peer\nspec:\n  type: postgres\n  config: {}\n");
    let err = translate(&doc).unwrap_err();
    assert!(err.to_string().contains("metadata.name"));
}

#[test]
fn mirror_translates_all_sub_records_into_the_flat_request() {
    let doc = document(
        r#"
kind: Mirror
metadata:
  name: orders-to-warehouse
spec:
  source: pg-main
  destination: sf-warehouse
  tables:
    - source: public.orders
      destination: ANALYTICS.PUBLIC.ORDERS
      partition_key: order_id
      exclude_columns: [internal_note, scratch]
    - source: public.customers
      destination: ANALYTICS.PUBLIC.CUSTOMERS
  cdc:
    batch_size: 2000
    idle_timeout_seconds: 30
    initial_snapshot: true
    publication_name: peerdb_pub
    replication_slot_name: peerdb_slot
  snapshot:
    num_rows_per_partition: 50000
    max_parallel_workers: 4
    num_tables_in_parallel: 2
  columns:
    soft_delete_column: _peerdb_deleted
    synced_at_column: _peerdb_synced_at
  env:
    PEERDB_CLICKHOUSE_MAX_INSERT_THREADS: "4"
"#,
    );

    let Request::CreateMirror(request) = translate(&doc).unwrap() else {
        panic!("expected a mirror request");
    };
    let configs = request.connection_configs;
    assert_eq!(configs.flow_job_name, "orders-to-warehouse");
    assert_eq!(configs.source_name, "pg-main");
    assert_eq!(configs.destination_name, "sf-warehouse");

    assert_eq!(configs.table_mappings.len(), 2);
    let first = &configs.table_mappings[0];
    assert_eq!(first.source_table_identifier, "public.orders");
    assert_eq!(first.destination_table_identifier, "ANALYTICS.PUBLIC.ORDERS");
    assert_eq!(first.partition_key, "order_id");
    assert_eq!(first.exclude, ["internal_note", "scratch"]);
    assert!(configs.table_mappings[1].partition_key.is_empty());

    assert_eq!(configs.max_batch_size, Some(2000));
    assert_eq!(configs.idle_timeout_seconds, Some(30));
    assert_eq!(configs.do_initial_snapshot, Some(true));
    assert_eq!(configs.publication_name.as_deref(), Some("peerdb_pub"));
    assert_eq!(configs.replication_slot_name.as_deref(), Some("peerdb_slot"));
    assert_eq!(configs.snapshot_num_rows_per_partition, Some(50000));
    assert_eq!(configs.snapshot_max_parallel_workers, Some(4));
    assert_eq!(configs.snapshot_num_tables_in_parallel, Some(2));
    assert_eq!(configs.soft_delete_col_name.as_deref(), Some("_peerdb_deleted"));
    assert_eq!(configs.synced_at_col_name.as_deref(), Some("_peerdb_synced_at"));
    assert_eq!(
        configs.env.get("PEERDB_CLICKHOUSE_MAX_INSERT_THREADS"),
        Some(&"4".to_string())
    );
}

#[test]
fn absent_optional_records_are_omitted_from_the_request() {
    let doc = document(
        r#"
kind: Mirror
metadata:
  name: bare-mirror
spec:
  source: pg-main
  destination: sf-warehouse
  tables:
    - source: public.orders
      destination: ANALYTICS.PUBLIC.ORDERS
"#,
    );

    let Request::CreateMirror(request) = translate(&doc).unwrap() else {
        panic!("expected a mirror request");
    };
    let json = serde_json::to_value(&request).unwrap();
    let configs = &json["connection_configs"];
    for absent in [
        "max_batch_size",
        "idle_timeout_seconds",
        "do_initial_snapshot",
        "publication_name",
        "replication_slot_name",
        "snapshot_num_rows_per_partition",
        "soft_delete_col_name",
        "synced_at_col_name",
        "env",
    ] {
        assert!(
            configs.get(absent).is_none(),
            "expected '{absent}' to be omitted"
        );
    }
}

#[test]
fn duplicate_table_mappings_pass_through_uninspected() {
    let doc = document(
        r#"
kind: Mirror
metadata:
  name: dupes
spec:
  source: pg-main
  destination: sf-warehouse
  tables:
    - source: public.orders
      destination: ANALYTICS.PUBLIC.ORDERS
    - source: public.orders
      destination: ANALYTICS.PUBLIC.ORDERS
"#,
    );

    let Request::CreateMirror(request) = translate(&doc).unwrap() else {
        panic!("expected a mirror request");
    };
    assert_eq!(request.connection_configs.table_mappings.len(), 2);
    assert_eq!(
        request.connection_configs.table_mappings[0],
        request.connection_configs.table_mappings[1]
    );
}

#[test]
fn empty_table_identifiers_fail_validation() {
    let doc = document(
        r#"
kind: Mirror
metadata:
  name: broken
spec:
  source: pg-main
  destination: sf-warehouse
  tables:
    - source: public.orders
      destination: ""
"#,
    );
    let err = translate(&doc).unwrap_err();
    assert!(matches!(err, CliError::Validation(_)));
    assert!(err.to_string().contains("destination"));
}

#[test]
fn mirror_requires_source_and_destination() {
    let doc = document(
        "kind: Mirror\nmetadata:\n  name: no-source\nspec:\n  destination: sf-warehouse\n",
    );
    let err = translate(&doc).unwrap_err();
    assert!(err.to_string().contains("spec.source"));
}
