//! Resource lifecycle.
//!
//! The host drives each resource instance through these entry points. Every
//! entry point reports problems into the caller's [`Diagnostics`] and, where
//! it produces state, returns it; `None` with no error diagnostic means the
//! instance no longer exists.

mod role;

pub use role::{new_role_resource, RoleResource, RoleResourceData};

use crate::diagnostics::Diagnostics;
use crate::provider::ProviderData;
use crate::schema::Schema;
use crate::types::Value;
use async_trait::async_trait;

/// Constructor the provider hands to the host, one per resource type.
pub type ResourceFactory = fn() -> Box<dyn Resource>;

#[async_trait]
pub trait Resource: Send + Sync {
    /// Full type name, e.g. `opensearch_security_plugin_role`.
    fn type_name(&self, provider_type_name: &str) -> String;

    fn schema(&self) -> &Schema;

    /// Receive the data produced by provider configuration. `None` when the
    /// provider has not been configured yet.
    fn configure(&mut self, data: Option<&ProviderData>, diags: &mut Diagnostics);

    /// Adjust a planned value before the host diffs it.
    fn modify_plan(&self, plan: &Value, diags: &mut Diagnostics) -> Option<Value> {
        match self.schema().modify_plan(plan) {
            Ok(planned) => Some(planned),
            Err(e) => {
                crate::diagnostics::AppendDiagnostics::append_diagnostics(&e, diags);
                None
            }
        }
    }

    async fn create(&self, plan: &Value, diags: &mut Diagnostics) -> Option<Value>;

    async fn read(&self, state: &Value, diags: &mut Diagnostics) -> Option<Value>;

    async fn update(&self, plan: &Value, diags: &mut Diagnostics) -> Option<Value>;

    async fn delete(&self, state: &Value, diags: &mut Diagnostics);

    /// Build state for an existing remote object identified by `id`.
    async fn import_state(&self, id: &str, diags: &mut Diagnostics) -> Option<Value>;
}
