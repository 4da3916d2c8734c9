//! Security API client.

use crate::classify::{parse_response, ResponseSink};
use crate::config::{ClientConfig, DEFAULT_CALL_TIMEOUT};
use crate::envelope::{RoleCollection, StatusEnvelope};
use crate::error::{ClientError, Result, TransportError};
use crate::logger::LoggingTransport;
use crate::model::Role;
use crate::request::ApiRequest;
use crate::retry::RetryTransport;
use crate::roles;
use crate::transport::{OpenSearchTransport, Transport};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tfos_log::{debug, info};

/// Status codes accepted from a role upsert. The cluster answers 201 when
/// the role is new and 200 when it replaced one.
pub const UPSERT_ACCEPTED: &[u16] = &[200, 201];

/// Client for the security-plugin roles API.
///
/// Cheap to clone. Every call runs under its own deadline.
#[derive(Clone)]
pub struct SecurityClient {
    transport: Arc<dyn Transport>,
    call_timeout: Duration,
}

impl SecurityClient {
    /// Create a client over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Create a client from configuration.
    ///
    /// The transport stack is OpenSearch, then retries when configured, then
    /// round-trip logging when enabled.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        info!("Creating security API client for: {:?}", config.urls);

        let base = OpenSearchTransport::new(config)?;
        let transport: Arc<dyn Transport> = match (&config.retry, config.logging.enabled) {
            (Some(retry), true) => Arc::new(LoggingTransport::new(
                RetryTransport::new(base, retry.clone()),
                config.logging,
            )),
            (Some(retry), false) => Arc::new(RetryTransport::new(base, retry.clone())),
            (None, true) => Arc::new(LoggingTransport::new(base, config.logging)),
            (None, false) => Arc::new(base),
        };

        Ok(Self {
            transport,
            call_timeout: config.call_timeout,
        })
    }

    /// Set the per-call deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// The per-call deadline.
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Perform one request and classify its response, all under one
    /// deadline.
    pub async fn call<S: ResponseSink>(&self, request: ApiRequest, accepted: &[u16]) -> Result<S> {
        let deadline = self.call_timeout;
        let exchange = async {
            let response = self.transport.perform(request).await?;
            parse_response::<S>(response, accepted).await
        };
        match tokio::time::timeout(deadline, exchange).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(deadline).into()),
        }
    }

    /// Look up one role by name with the single-role endpoint.
    ///
    /// `Ok(None)` when the cluster answers 404, or answers 200 without the
    /// role. Any other status, or a report carrying root causes, is an
    /// error.
    pub async fn find_role(&self, name: &str) -> Result<Option<Role>> {
        let mut roles: RoleCollection = self.call(roles::get_role(name, None), &[200, 404]).await?;
        if let Some(status) = roles.status() {
            if status.has_errors() {
                return Err(ClientError::Status(status.clone()));
            }
            debug!("Role {} lookup returned status: {}", name, status.summary());
            return Ok(None);
        }
        Ok(roles.take(name))
    }

    /// Fetch every role the caller can see.
    pub async fn fetch_roles(&self) -> Result<RoleCollection> {
        self.call(roles::get_roles(None), &[200]).await
    }

    /// Fetch one role from the full collection.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] when the collection does not contain
    /// `name`; [`ClientError::Status`] when the cluster answered with a
    /// report carrying root causes.
    pub async fn read_role(&self, name: &str) -> Result<Role> {
        let mut roles = self.fetch_roles().await?;
        if let Some(status) = roles.status() {
            if status.has_errors() {
                return Err(ClientError::Status(status.clone()));
            }
        }
        roles.take(name).ok_or_else(|| ClientError::NotFound {
            name: name.to_string(),
        })
    }

    /// Create or replace a role.
    ///
    /// A 200/201 response whose body still carries root causes is an error.
    pub async fn put_role(&self, name: &str, role: &Role) -> Result<StatusEnvelope> {
        let status: StatusEnvelope = self
            .call(roles::upsert_role_json(name, role, None)?, UPSERT_ACCEPTED)
            .await?;
        if status.has_errors() {
            return Err(ClientError::Status(status));
        }
        Ok(status)
    }

    /// Delete a role.
    ///
    /// A 200 response whose body still carries root causes is an error.
    pub async fn remove_role(&self, name: &str) -> Result<StatusEnvelope> {
        let status: StatusEnvelope = self.call(roles::delete_role(name, None), &[200]).await?;
        if status.has_errors() {
            return Err(ClientError::Status(status));
        }
        Ok(status)
    }

    /// Product check against `GET /`.
    pub async fn info(&self) -> Result<ClusterInfo> {
        self.call(ApiRequest::get("/"), &[200]).await
    }
}

impl std::fmt::Debug for SecurityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityClient")
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

/// Subset of the cluster root endpoint response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClusterInfo {
    /// Node name.
    #[serde(default)]
    pub name: String,
    /// Cluster name.
    #[serde(default)]
    pub cluster_name: String,
    /// Version block.
    #[serde(default)]
    pub version: ClusterVersion,
}

/// Version block of [`ClusterInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClusterVersion {
    /// Distribution, `opensearch` for OpenSearch clusters.
    #[serde(default)]
    pub distribution: Option<String>,
    /// Version number.
    #[serde(default)]
    pub number: String,
}

impl ClusterInfo {
    /// Whether the cluster identifies as OpenSearch.
    pub fn is_opensearch(&self) -> bool {
        self.version.distribution.as_deref() == Some("opensearch")
    }
}

impl ResponseSink for ClusterInfo {
    fn decode(bytes: &[u8]) -> std::result::Result<Self, crate::error::DecodeError> {
        serde_json::from_slice(bytes).map_err(crate::error::DecodeError::Body)
    }
}
