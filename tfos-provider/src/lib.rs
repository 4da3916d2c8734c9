//! Terraform-facing layer of the OpenSearch provider.
//!
//! Everything the host framework sees lives here: the provider and resource
//! schemas, the typed attribute model, diagnostics, and the
//! `opensearch_security_plugin_role` resource whose lifecycle drives the
//! security API client.
//!
//! ## Lifecycle
//!
//! ```no_run
//! use tfos_provider::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() {
//! let provider = OpenSearchProvider::new("0.1.0");
//! let mut diags = Diagnostics::new();
//!
//! let data = provider
//!     .configure(&json!({"addresses": ["https://localhost:9200"]}), &mut diags)
//!     .await;
//!
//! let mut roles = RoleResource::default();
//! roles.configure(data.as_ref(), &mut diags);
//!
//! let state = roles.import_state("readers", &mut diags).await;
//! for diagnostic in diags.iter() {
//!     eprintln!("{}", diagnostic);
//! }
//! # let _ = state;
//! # }
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod mapper;
pub mod modifiers;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod types;

pub use config::{ConfigValidator, LoggingBlock, ProviderConfig, Validate};
pub use diagnostics::{append_client_error, AppendDiagnostics, Diagnostic, Diagnostics, Severity};
pub use error::{AttrError, ConfigError, Result};
pub use modifiers::{DefaultEmptyList, DefaultString, PlanModifier};
pub use provider::{OpenSearchProvider, ProviderData, ProviderMetadata};
pub use resource::{Resource, ResourceFactory, RoleResource, RoleResourceData};
pub use schema::{AttributeMode, AttributeSchema, Schema, PROVIDER_NAME};
pub use types::{AttrType, ListValue, ObjectType, ObjectValue, Value};

/// Prelude for common imports
pub mod prelude {
    pub use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
    pub use crate::provider::{OpenSearchProvider, ProviderData};
    pub use crate::resource::{Resource, RoleResource};
    pub use crate::schema::{attr, ROLE_SCHEMA};
    pub use crate::types::{AttrType, Value};
}
