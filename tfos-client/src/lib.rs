//! OpenSearch security-plugin roles API client.
//!
//! This crate provides the request/response layer for managing roles:
//! - Request builders for the roles endpoints
//! - Decoding of the polymorphic response envelope (status report or role map)
//! - Response classification against accepted status codes
//! - A pluggable [`Transport`] with OpenSearch, retrying and logging implementations
//!
//! # Example
//!
//! ```rust,no_run
//! use tfos_client::{ClientConfig, Role, SecurityClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://localhost:9200")
//!         .with_basic_auth("admin", "admin");
//!     let client = SecurityClient::from_config(&config)?;
//!
//!     let role = Role::new("Read-only access to logs")
//!         .with_cluster_permission("cluster_composite_ops_ro");
//!
//!     if client.find_role("logs_reader").await?.is_none() {
//!         client.put_role("logs_reader", &role).await?;
//!     }
//!
//!     let stored = client.read_role("logs_reader").await?;
//!     println!("reserved: {:?}", stored.reserved);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod classify;
mod client;
mod config;
mod envelope;
mod error;
mod logger;
mod model;
mod request;
mod response;
mod retry;
pub mod roles;
mod transport;

pub use classify::{parse_response, ResponseSink};
pub use client::{ClusterInfo, ClusterVersion, SecurityClient, UPSERT_ACCEPTED};
pub use config::{ClientConfig, LoggingConfig, TlsConfig, DEFAULT_CALL_TIMEOUT};
pub use envelope::{
    decode_envelope, decode_status, Envelope, RoleCollection, RootCause, RootCauses,
    StatusEnvelope, STATUS_CODE_MISMATCH,
};
pub use error::{ClientError, DecodeError, ErrorKind, Result, TransportError};
pub use logger::LoggingTransport;
pub use model::{IndexPermission, Role, TenantPermission};
pub use request::{ApiRequest, APPLICATION_JSON};
pub use response::{ApiResponse, BufferedBody, ResponseBody};
pub use retry::{BackoffStrategy, RetryConfig, RetryTransport};
pub use transport::{OpenSearchTransport, Transport};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ApiRequest, ApiResponse, ClientConfig, ClientError, Envelope, ErrorKind, IndexPermission,
        Result, Role, RoleCollection, SecurityClient, StatusEnvelope, TenantPermission, Transport,
    };
}
