//! The `opensearch` provider.

use crate::config::{ProviderConfig, Validate};
use crate::diagnostics::Diagnostics;
use crate::resource::{new_role_resource, ResourceFactory};
use crate::schema::{Schema, PROVIDER_NAME, PROVIDER_SCHEMA};
use std::sync::Arc;
use tfos_client::{SecurityClient, Transport};
use tfos_log::{debug, info, warn};

/// Provider type name and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub type_name: String,
    pub version: String,
}

/// Data shared with every resource once the provider is configured.
#[derive(Debug, Clone)]
pub struct ProviderData {
    pub client: SecurityClient,
}

/// OpenSearch provider
#[derive(Clone, Default)]
pub struct OpenSearchProvider {
    version: String,
    transport: Option<Arc<dyn Transport>>,
}

impl OpenSearchProvider {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            transport: None,
        }
    }

    /// Use `transport` instead of building one from the configuration.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: PROVIDER_NAME.to_string(),
            version: self.version.clone(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &PROVIDER_SCHEMA
    }

    /// Build the client for a provider block and check the cluster is
    /// reachable.
    ///
    /// `config` is the JSON rendering of the block. Returns `None` after
    /// adding an error diagnostic when the block is invalid, the client
    /// cannot be built or the product check fails.
    pub async fn configure(
        &self,
        config: &serde_json::Value,
        diags: &mut Diagnostics,
    ) -> Option<ProviderData> {
        let config = match ProviderConfig::from_value(config).and_then(ProviderConfig::with_env) {
            Ok(config) => config,
            Err(e) => {
                diags.add_error("Invalid provider configuration", e.to_string());
                return None;
            }
        };
        if let Err(e) = config.validate() {
            diags.add_error("Invalid provider configuration", e.to_string());
            return None;
        }
        debug!("Provider configuration: {:?}", config);

        let client = match &self.transport {
            Some(transport) => SecurityClient::new(Arc::clone(transport)),
            None => match SecurityClient::from_config(&config.to_client_config()) {
                Ok(client) => client,
                Err(e) => {
                    diags.add_error(
                        "Error constructing OpenSearch client",
                        format!("Error occurred constructing OpenSearch client: {}", e),
                    );
                    return None;
                }
            },
        };

        if config.skip_init_product_check() {
            debug!("Skipping init product check");
        } else {
            match client.info().await {
                Ok(info) if info.is_opensearch() => {
                    info!("Connected to OpenSearch {} ({})", info.version.number, info.cluster_name)
                }
                Ok(info) => {
                    warn!("Cluster {} does not identify as OpenSearch", info.cluster_name);
                    diags.add_warning(
                        "Unexpected cluster distribution",
                        format!(
                            "Cluster {:?} reports distribution {:?}, expected \"opensearch\"",
                            info.cluster_name,
                            info.version.distribution.as_deref().unwrap_or_default()
                        ),
                    );
                }
                Err(e) => {
                    diags.add_error(
                        "Error performing init compatibility check",
                        format!("Error occurred during init compatibility check: {}", e),
                    );
                    return None;
                }
            }
        }

        Some(ProviderData { client })
    }

    /// Resource types this provider serves.
    pub fn resources(&self) -> Vec<ResourceFactory> {
        vec![new_role_resource]
    }
}

impl std::fmt::Debug for OpenSearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchProvider")
            .field("version", &self.version)
            .field("transport", &self.transport.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tfos_client::TransportError;
    use tfos_testing::*;

    fn block() -> serde_json::Value {
        json!({"addresses": ["https://localhost:9200"], "username": "admin", "password": "admin"})
    }

    #[test]
    fn test_metadata() {
        let provider = OpenSearchProvider::new("1.2.3");
        assert_eq!(
            provider.metadata(),
            ProviderMetadata {
                type_name: "opensearch".into(),
                version: "1.2.3".into()
            }
        );
        assert!(provider.schema().attribute("addresses").is_some());
    }

    #[tokio::test]
    async fn test_configure_runs_product_check() {
        let mock = MockTransport::new().with_response(json_response(
            200,
            &json!({"name": "n1", "cluster_name": "c1", "version": {"distribution": "opensearch", "number": "2.11.1"}}),
        ));
        let provider = OpenSearchProvider::new("test").with_transport(Arc::new(mock.clone()));
        let mut diags = Diagnostics::new();

        assert!(provider.configure(&block(), &mut diags).await.is_some());
        assert!(diags.is_empty());
        assert!(mock.was_called(&http::Method::GET, "/"));
    }

    #[tokio::test]
    async fn test_configure_product_check_failure() {
        let mock = MockTransport::new().with_error(TransportError::Connection("refused".into()));
        let provider = OpenSearchProvider::new("test").with_transport(Arc::new(mock));
        let mut diags = Diagnostics::new();

        assert!(provider.configure(&block(), &mut diags).await.is_none());
        let error = diags.errors().next().unwrap();
        assert_eq!(error.summary, "Error performing init compatibility check");
        assert!(error.detail.starts_with("Error occurred during init compatibility check: "));
    }

    #[tokio::test]
    async fn test_configure_skips_product_check() {
        let mock = MockTransport::new();
        let provider = OpenSearchProvider::new("test").with_transport(Arc::new(mock.clone()));
        let mut config = block();
        config["skip_init_product_check"] = json!(true);
        let mut diags = Diagnostics::new();

        assert!(provider.configure(&config, &mut diags).await.is_some());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_configure_invalid_block() {
        let provider = OpenSearchProvider::new("test").with_transport(Arc::new(MockTransport::new()));
        let mut diags = Diagnostics::new();

        let config = json!({"addresses": ["not a url"], "skip_init_product_check": true});
        assert!(provider.configure(&config, &mut diags).await.is_none());
        assert_eq!(diags.errors().next().unwrap().summary, "Invalid provider configuration");
    }

    #[test]
    fn test_resources() {
        let resources = OpenSearchProvider::new("test").resources();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0]().type_name(PROVIDER_NAME), "opensearch_security_plugin_role");
    }
}
