//! HTTP client for the flow service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{
    CreateMirrorRequest, CreateMirrorResponse, CreatePeerRequest, CreatePeerResponse,
    DropPeerRequest, FlowConfigUpdate, FlowState, FlowStateChangeRequest, ListMirrorsResponse,
    ListPeersResponse, MirrorStatusRequest, MirrorStatusResponse, Peer, ValidatePeerRequest,
    ValidatePeerResponse,
};
use crate::error::{CliError, Result};
use crate::settings::Settings;

/// Deadline for a single remote call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The fixed set of control-plane operations the CLI depends on. The
/// orchestrator and the destructive commands talk to this trait so tests
/// can substitute a stub.
#[async_trait]
pub trait FlowService {
    async fn create_peer(&self, peer: Peer, allow_update: bool) -> Result<CreatePeerResponse>;
    async fn validate_peer(&self, peer: Peer) -> Result<ValidatePeerResponse>;
    async fn drop_peer(&self, peer_name: &str) -> Result<()>;
    async fn list_peers(&self) -> Result<ListPeersResponse>;
    async fn create_mirror(&self, request: CreateMirrorRequest) -> Result<CreateMirrorResponse>;
    async fn list_mirrors(&self) -> Result<ListMirrorsResponse>;
    async fn mirror_status(&self, mirror_name: &str) -> Result<MirrorStatusResponse>;
    async fn pause_mirror(&self, mirror_name: &str) -> Result<()>;
    async fn resume_mirror(&self, mirror_name: &str) -> Result<()>;
    async fn drop_mirror(&self, mirror_name: &str, skip_destination_drop: bool) -> Result<()>;
    async fn update_mirror(&self, mirror_name: &str, update: FlowConfigUpdate) -> Result<()>;
}

pub struct FlowClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl FlowClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let scheme = if settings.tls { "https" } else { "http" };
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CliError::Remote(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: format!("{scheme}://{}", settings.address()),
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "flow service call");
        let mut request = self.http.request(method, url);
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }
        request
    }

    async fn send<R: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<R> {
        let response = request.send().await.map_err(transport_err)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CliError::Remote(format!("server returned {status}: {body}")));
        }
        response.json().await.map_err(transport_err)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<T: Serialize, R: DeserializeOwned>(&self, path: &str, body: &T) -> Result<R> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// POST for endpoints whose response body carries nothing we use.
    async fn post_unit<T: Serialize>(&self, path: &str, body: &T) -> Result<()> {
        let response = self
            .request(Method::POST, path)
            .json(body)
            .send()
            .await
            .map_err(transport_err)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CliError::Remote(format!("server returned {status}: {body}")));
        }
        Ok(())
    }

    async fn state_change(&self, request: &FlowStateChangeRequest) -> Result<()> {
        self.post_unit("/api/v1/mirrors/state_change", request).await
    }
}

fn transport_err(err: reqwest::Error) -> CliError {
    if err.is_timeout() {
        CliError::Timeout(REQUEST_TIMEOUT)
    } else {
        CliError::Remote(err.to_string())
    }
}

fn stage_err(stage: &str, err: CliError) -> CliError {
    match err {
        CliError::Remote(message) => CliError::Remote(format!("{stage}: {message}")),
        other => other,
    }
}

#[async_trait]
impl FlowService for FlowClient {
    async fn create_peer(&self, peer: Peer, allow_update: bool) -> Result<CreatePeerResponse> {
        self.post(
            "/api/v1/peers/create",
            &CreatePeerRequest { peer, allow_update },
        )
        .await
    }

    async fn validate_peer(&self, peer: Peer) -> Result<ValidatePeerResponse> {
        self.post("/api/v1/peers/validate", &ValidatePeerRequest { peer })
            .await
    }

    async fn drop_peer(&self, peer_name: &str) -> Result<()> {
        self.post_unit(
            "/api/v1/peers/drop",
            &DropPeerRequest {
                peer_name: peer_name.to_string(),
            },
        )
        .await
    }

    async fn list_peers(&self) -> Result<ListPeersResponse> {
        self.get("/api/v1/peers/list").await
    }

    async fn create_mirror(&self, request: CreateMirrorRequest) -> Result<CreateMirrorResponse> {
        self.post("/api/v1/mirrors/create", &request).await
    }

    async fn list_mirrors(&self) -> Result<ListMirrorsResponse> {
        self.get("/api/v1/mirrors/list").await
    }

    async fn mirror_status(&self, mirror_name: &str) -> Result<MirrorStatusResponse> {
        self.post(
            "/api/v1/mirrors/status",
            &MirrorStatusRequest {
                flow_job_name: mirror_name.to_string(),
                include_flow_info: true,
                exclude_batches: false,
            },
        )
        .await
    }

    async fn pause_mirror(&self, mirror_name: &str) -> Result<()> {
        self.state_change(&FlowStateChangeRequest {
            flow_job_name: mirror_name.to_string(),
            requested_flow_state: FlowState::StatusPaused,
            drop_mirror_stats: false,
            skip_destination_drop: false,
            flow_config_update: None,
        })
        .await
    }

    async fn resume_mirror(&self, mirror_name: &str) -> Result<()> {
        self.state_change(&FlowStateChangeRequest {
            flow_job_name: mirror_name.to_string(),
            requested_flow_state: FlowState::StatusRunning,
            drop_mirror_stats: false,
            skip_destination_drop: false,
            flow_config_update: None,
        })
        .await
    }

    async fn drop_mirror(&self, mirror_name: &str, skip_destination_drop: bool) -> Result<()> {
        self.state_change(&FlowStateChangeRequest {
            flow_job_name: mirror_name.to_string(),
            requested_flow_state: FlowState::StatusTerminated,
            drop_mirror_stats: true,
            skip_destination_drop,
            flow_config_update: None,
        })
        .await
    }

    /// The update protocol is pause, submit the new configuration, resume.
    async fn update_mirror(&self, mirror_name: &str, update: FlowConfigUpdate) -> Result<()> {
        self.pause_mirror(mirror_name)
            .await
            .map_err(|e| stage_err("failed to pause mirror", e))?;

        self.state_change(&FlowStateChangeRequest {
            flow_job_name: mirror_name.to_string(),
            requested_flow_state: FlowState::StatusPaused,
            drop_mirror_stats: false,
            skip_destination_drop: false,
            flow_config_update: Some(update),
        })
        .await
        .map_err(|e| stage_err("failed to update mirror configuration", e))?;

        self.resume_mirror(mirror_name)
            .await
            .map_err(|e| stage_err("failed to resume mirror after update", e))
    }
}
