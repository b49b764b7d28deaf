//! Apply/validate orchestration against a stubbed flow service.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use mirrorctl::api::{
    CreateMirrorRequest, CreateMirrorResponse, CreatePeerResponse, CreatePeerStatus,
    FlowConfigUpdate, FlowState, ListMirrorsResponse, ListPeersResponse, MirrorStatusResponse,
    Peer, ValidatePeerResponse, ValidatePeerStatus,
};
use mirrorctl::apply::{apply_documents, validate_documents, ApplyOptions};
use mirrorctl::client::FlowService;
use mirrorctl::error::{CliError, Result as CliResult};
use mirrorctl::loader::LoadedDocument;

/// Records every call; creation calls fail for the configured name.
#[derive(Default)]
struct StubFlowService {
    calls: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl StubFlowService {
    fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn should_fail(&self, name: &str) -> bool {
        self.fail_on.as_deref() == Some(name)
    }
}

#[async_trait]
impl FlowService for StubFlowService {
    async fn create_peer(&self, peer: Peer, _allow_update: bool) -> CliResult<CreatePeerResponse> {
        self.record(format!("create_peer:{}", peer.name));
        if self.should_fail(&peer.name) {
            return Err(CliError::Remote("simulated failure".to_string()));
        }
        Ok(CreatePeerResponse {
            status: CreatePeerStatus::Created,
            message: String::new(),
        })
    }

    async fn validate_peer(&self, peer: Peer) -> CliResult<ValidatePeerResponse> {
        self.record(format!("validate_peer:{}", peer.name));
        Ok(ValidatePeerResponse {
            status: ValidatePeerStatus::Valid,
            message: String::new(),
        })
    }

    async fn drop_peer(&self, peer_name: &str) -> CliResult<()> {
        self.record(format!("drop_peer:{peer_name}"));
        Ok(())
    }

    async fn list_peers(&self) -> CliResult<ListPeersResponse> {
        self.record("list_peers".to_string());
        Ok(ListPeersResponse::default())
    }

    async fn create_mirror(&self, request: CreateMirrorRequest) -> CliResult<CreateMirrorResponse> {
        let name = request.connection_configs.flow_job_name;
        self.record(format!("create_mirror:{name}"));
        if self.should_fail(&name) {
            return Err(CliError::Remote("simulated failure".to_string()));
        }
        Ok(CreateMirrorResponse {
            workflow_id: "workflow-1".to_string(),
        })
    }

    async fn list_mirrors(&self) -> CliResult<ListMirrorsResponse> {
        self.record("list_mirrors".to_string());
        Ok(ListMirrorsResponse::default())
    }

    async fn mirror_status(&self, mirror_name: &str) -> CliResult<MirrorStatusResponse> {
        self.record(format!("mirror_status:{mirror_name}"));
        Ok(MirrorStatusResponse {
            flow_job_name: mirror_name.to_string(),
            current_flow_state: FlowState::StatusRunning,
            created_at: None,
            cdc_status: None,
        })
    }

    async fn pause_mirror(&self, mirror_name: &str) -> CliResult<()> {
        self.record(format!("pause_mirror:{mirror_name}"));
        Ok(())
    }

    async fn resume_mirror(&self, mirror_name: &str) -> CliResult<()> {
        self.record(format!("resume_mirror:{mirror_name}"));
        Ok(())
    }

    async fn drop_mirror(&self, mirror_name: &str, _skip_destination_drop: bool) -> CliResult<()> {
        self.record(format!("drop_mirror:{mirror_name}"));
        Ok(())
    }

    async fn update_mirror(&self, mirror_name: &str, _update: FlowConfigUpdate) -> CliResult<()> {
        self.record(format!("update_mirror:{mirror_name}"));
        Ok(())
    }
}

fn loaded(name: &str, text: String) -> LoadedDocument {
    LoadedDocument {
        path: PathBuf::from(format!("{name}.yaml")),
        document: serde_yaml::from_str(&text).unwrap(),
    }
}

fn peer_document(name: &str) -> LoadedDocument {
    loaded(
        name,
        format!(
            r#"
kind: Peer
metadata:
  name: {name}
spec:
  type: postgres
  config:
    host: db.internal
    user: replicator
    database: appdb
"#
        ),
    )
}

fn mirror_document(name: &str) -> LoadedDocument {
    loaded(
        name,
        format!(
            r#"
kind: Mirror
metadata:
  name: {name}
spec:
  source: pg-main
  destination: sf-warehouse
  tables:
    - source: public.orders
      destination: ANALYTICS.PUBLIC.ORDERS
"#
        ),
    )
}

fn unsupported_document(name: &str) -> LoadedDocument {
    loaded(name, format!("kind: Gadget\nmetadata:\n  name: {name}\n"))
}

#[tokio::test]
async fn apply_submits_documents_in_load_order() {
    let service = StubFlowService::default();
    let documents = vec![
        peer_document("pg-main"),
        peer_document("sf-warehouse"),
        mirror_document("orders"),
    ];

    let applied = apply_documents(&service, &documents, &ApplyOptions::default())
        .await
        .unwrap();

    assert_eq!(applied, 3);
    assert_eq!(
        service.calls(),
        [
            "create_peer:pg-main",
            "create_peer:sf-warehouse",
            "create_mirror:orders"
        ]
    );
}

#[tokio::test]
async fn apply_halts_at_the_first_remote_failure() {
    let service = StubFlowService::failing_on("second");
    let documents = vec![
        peer_document("first"),
        peer_document("second"),
        peer_document("third"),
    ];

    let err = apply_documents(&service, &documents, &ApplyOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Remote(_)));
    // Exactly one document was applied and the third was never attempted.
    assert_eq!(service.calls(), ["create_peer:first", "create_peer:second"]);
}

#[tokio::test]
async fn apply_halts_at_the_first_translation_failure() {
    let service = StubFlowService::default();
    let documents = vec![
        peer_document("first"),
        unsupported_document("strange"),
        peer_document("third"),
    ];

    let err = apply_documents(&service, &documents, &ApplyOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::UnsupportedKind(_)));
    assert_eq!(service.calls(), ["create_peer:first"]);
}

#[tokio::test]
async fn dry_run_never_touches_the_service() {
    let service = StubFlowService::default();
    let documents = vec![
        peer_document("pg-main"),
        unsupported_document("strange"),
        mirror_document("orders"),
    ];

    let options = ApplyOptions {
        dry_run: true,
        force: false,
    };
    let applied = apply_documents(&service, &documents, &options).await.unwrap();

    assert_eq!(applied, 0);
    assert!(service.calls().is_empty());
}

#[test]
fn validate_reports_every_document_without_short_circuiting() {
    let documents = vec![
        peer_document("first"),
        unsupported_document("strange"),
        mirror_document("third"),
    ];

    let outcomes = validate_documents(&documents);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].error.is_none());
    assert!(matches!(
        outcomes[1].error,
        Some(CliError::UnsupportedKind(_))
    ));
    assert!(outcomes[2].error.is_none());
}

#[test]
fn validate_passes_when_every_document_is_valid() {
    let documents = vec![peer_document("first"), mirror_document("second")];
    let outcomes = validate_documents(&documents);
    assert!(outcomes.iter().all(|outcome| outcome.error.is_none()));
}
