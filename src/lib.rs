// terraform-provider-opensearch - OpenSearch security plugin roles as Terraform resources
//
// This library ties together the security API client, the Terraform-facing
// provider layer and the provider's structured logging.

// Re-export the workspace crates
pub use tfos_client as client;
pub use tfos_log as log;
pub use tfos_provider as provider;

// Re-export the most used types at the top level
pub use tfos_client::{ClientConfig, ClientError, ErrorKind, Role, SecurityClient, StatusEnvelope};
pub use tfos_provider::{Diagnostic, Diagnostics, OpenSearchProvider, Resource, RoleResource, Value};

// Re-export optional crates
#[cfg(feature = "testing")]
pub use tfos_testing as testing;

/// Prelude for common imports
pub mod prelude {
    pub use tfos_client::prelude::*;
    pub use tfos_provider::prelude::*;
}
