// Security plugin role resource

use super::Resource;
use crate::diagnostics::{append_client_error, AppendDiagnostics, Diagnostics};
use crate::error::{AttrError, Result};
use crate::mapper::{
    bool_to_value, index_permissions_to_list, list_to_index_permissions, list_to_strings,
    list_to_tenant_permissions, strings_to_list, tenant_permissions_to_list,
};
use crate::provider::ProviderData;
use crate::schema::{
    attr, type_name, Schema, INDEX_PERMISSION_TYPE, RESOURCE_TYPE_SECURITY_PLUGIN_ROLE, ROLE_SCHEMA,
    TENANT_PERMISSION_TYPE,
};
use crate::types::{AttrType, Value};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tfos_client::{ClientError, ErrorKind, Role, SecurityClient};
use tfos_log::{debug, info};

/// Typed state of one role instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleResourceData {
    pub role_name: Value,
    pub description: Value,
    pub cluster_permissions: Value,
    pub index_permissions: Value,
    pub tenant_permissions: Value,
    pub reserved: Value,
    pub hidden: Value,
    pub static_: Value,
}

impl RoleResourceData {
    /// Read a plan or state object.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = ROLE_SCHEMA.check(value)?;
        Ok(Self {
            role_name: obj.get(attr::ROLE_NAME)?.clone(),
            description: obj.get(attr::DESCRIPTION)?.clone(),
            cluster_permissions: obj.get(attr::CLUSTER_PERMISSIONS)?.clone(),
            index_permissions: obj.get(attr::INDEX_PERMISSIONS)?.clone(),
            tenant_permissions: obj.get(attr::TENANT_PERMISSIONS)?.clone(),
            reserved: obj.get(attr::RESERVED)?.clone(),
            hidden: obj.get(attr::HIDDEN)?.clone(),
            static_: obj.get(attr::STATIC)?.clone(),
        })
    }

    /// State for a role fetched from the cluster.
    pub fn from_role(name: &str, role: &Role) -> Result<Self> {
        let mut data = Self {
            role_name: Value::null(AttrType::String),
            description: Value::null(AttrType::String),
            cluster_permissions: Value::null(AttrType::list(AttrType::String)),
            index_permissions: Value::null(AttrType::list(AttrType::Object(INDEX_PERMISSION_TYPE.clone()))),
            tenant_permissions: Value::null(AttrType::list(AttrType::Object(TENANT_PERMISSION_TYPE.clone()))),
            reserved: Value::null(AttrType::Bool),
            hidden: Value::null(AttrType::Bool),
            static_: Value::null(AttrType::Bool),
        };
        data.update_from_role(name, role)?;
        Ok(data)
    }

    pub fn role_name(&self) -> Result<String> {
        self.role_name
            .as_str()
            .map(String::from)
            .ok_or_else(|| AttrError::NullValue(attr::ROLE_NAME.to_string()))
    }

    /// Overwrite every attribute with what the cluster reports.
    ///
    /// An empty `cluster_permissions` becomes null while empty permission
    /// blocks stay explicit lists, matching what the plan modifiers plan.
    pub fn update_from_role(&mut self, name: &str, role: &Role) -> Result<()> {
        self.role_name = Value::string(name);
        self.description = Value::string(role.description.as_str());
        self.cluster_permissions = strings_to_list(&role.cluster_permissions, true);
        self.index_permissions = index_permissions_to_list(&role.index_permissions, false)?;
        self.tenant_permissions = tenant_permissions_to_list(&role.tenant_permissions, false)?;
        self.reserved = bool_to_value(role.reserved);
        self.hidden = bool_to_value(role.hidden);
        self.static_ = bool_to_value(role.static_);
        Ok(())
    }

    /// Role body for an upsert. Computed flags are never sent.
    pub fn to_role(&self) -> Result<Role> {
        let description = match &self.description {
            Value::String(s) => s.clone(),
            Value::Null(AttrType::String) | Value::Unknown(AttrType::String) => String::new(),
            other => return Err(AttrError::mismatch(attr::DESCRIPTION, AttrType::String, other.ty())),
        };
        Ok(Role {
            description,
            cluster_permissions: list_to_strings(&self.cluster_permissions, attr::CLUSTER_PERMISSIONS)?,
            index_permissions: list_to_index_permissions(&self.index_permissions)?,
            tenant_permissions: list_to_tenant_permissions(&self.tenant_permissions)?,
            ..Role::default()
        })
    }

    pub fn to_value(&self) -> Result<Value> {
        let attrs: BTreeMap<String, Value> = [
            (attr::ROLE_NAME, &self.role_name),
            (attr::DESCRIPTION, &self.description),
            (attr::CLUSTER_PERMISSIONS, &self.cluster_permissions),
            (attr::INDEX_PERMISSIONS, &self.index_permissions),
            (attr::TENANT_PERMISSIONS, &self.tenant_permissions),
            (attr::RESERVED, &self.reserved),
            (attr::HIDDEN, &self.hidden),
            (attr::STATIC, &self.static_),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
        Value::object(ROLE_SCHEMA.object_type(), attrs)
    }
}

/// `opensearch_security_plugin_role`
#[derive(Debug, Clone, Default)]
pub struct RoleResource {
    client: Option<SecurityClient>,
}

/// Unconfigured role resource, for [`crate::OpenSearchProvider::resources`].
pub fn new_role_resource() -> Box<dyn Resource> {
    Box::new(RoleResource::default())
}

impl RoleResource {
    pub fn with_client(client: SecurityClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    fn client(&self, diags: &mut Diagnostics) -> Option<&SecurityClient> {
        if self.client.is_none() {
            diags.add_error(
                "Unconfigured provider",
                "The provider must be configured before roles can be managed",
            );
        }
        self.client.as_ref()
    }

    /// PUT the planned role, then read it back for the computed flags.
    async fn upsert(
        &self,
        client: &SecurityClient,
        name: &str,
        mut data: RoleResourceData,
        summary: &str,
        context: &str,
        diags: &mut Diagnostics,
    ) -> Option<Value> {
        let role = report(data.to_role(), diags)?;

        match client.put_role(name, &role).await {
            Ok(status) => status.append_diagnostics(diags),
            Err(ClientError::Encode(e)) => {
                diags.add_error(
                    "Error marshalling plan into OpenSearch request",
                    format!("Error json-encoding plan data into OpenSearch request: {}", e),
                );
                return None;
            }
            Err(e) => {
                append_client_error(diags, summary, context, &e);
                return None;
            }
        }

        let stored = match client.read_role(name).await {
            Ok(stored) => stored,
            Err(e) => {
                append_client_error(
                    diags,
                    "Error reading role",
                    &format!("Error occurred reading back role {:?}", name),
                    &e,
                );
                return None;
            }
        };

        report(data.update_from_role(name, &stored), diags)?;
        report(data.to_value(), diags)
    }
}

#[async_trait]
impl Resource for RoleResource {
    fn type_name(&self, provider_type_name: &str) -> String {
        type_name(provider_type_name, RESOURCE_TYPE_SECURITY_PLUGIN_ROLE)
    }

    fn schema(&self) -> &Schema {
        &ROLE_SCHEMA
    }

    fn configure(&mut self, data: Option<&ProviderData>, diags: &mut Diagnostics) {
        match data {
            Some(data) => self.client = Some(data.client.clone()),
            None => diags.add_warning("Provider is not configured", "Provider is not configured"),
        }
    }

    async fn create(&self, plan: &Value, diags: &mut Diagnostics) -> Option<Value> {
        let client = self.client(diags)?;
        let data = report(RoleResourceData::from_value(plan), diags)?;
        let name = report(data.role_name(), diags)?;

        info!("Creating role {}", name);

        // Only a definite "absent" lets the PUT through; a refused or failed
        // lookup must not be mistaken for one.
        match client.find_role(&name).await {
            Ok(Some(_)) => {
                diags.add_error(
                    "Role already exists",
                    format!("Role {:?} already exists in cluster", name),
                );
                return None;
            }
            Ok(None) => debug!("Role {} does not exist yet", name),
            Err(e) => {
                append_client_error(
                    diags,
                    "Error querying for role",
                    &format!("Error occurred looking for existing role {:?}", name),
                    &e,
                );
                return None;
            }
        }

        self.upsert(
            client,
            &name,
            data,
            "Error creating role",
            "Error executing create role request",
            diags,
        )
        .await
    }

    async fn read(&self, state: &Value, diags: &mut Diagnostics) -> Option<Value> {
        let client = self.client(diags)?;
        let mut data = report(RoleResourceData::from_value(state), diags)?;
        let name = report(data.role_name(), diags)?;

        match client.read_role(&name).await {
            Ok(role) => {
                report(data.update_from_role(&name, &role), diags)?;
                report(data.to_value(), diags)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                diags.add_warning(
                    "Role not found",
                    format!("Role {:?} not found, removing it from state", name),
                );
                None
            }
            Err(e) => {
                append_client_error(
                    diags,
                    "Error querying for role",
                    &format!("Error occurred querying for role {:?}", name),
                    &e,
                );
                None
            }
        }
    }

    async fn update(&self, plan: &Value, diags: &mut Diagnostics) -> Option<Value> {
        let client = self.client(diags)?;
        let data = report(RoleResourceData::from_value(plan), diags)?;
        let name = report(data.role_name(), diags)?;

        info!("Updating role {}", name);

        // The upsert would silently recreate a role deleted out of band.
        match client.find_role(&name).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                diags.add_error(
                    "Role not found",
                    format!("Role {:?} was not found in cluster", name),
                );
                return None;
            }
            Err(e) => {
                append_client_error(
                    diags,
                    "Error querying for role",
                    &format!("Error occurred querying for role {:?}", name),
                    &e,
                );
                return None;
            }
        }

        self.upsert(
            client,
            &name,
            data,
            "Error updating role",
            "Error executing update role request",
            diags,
        )
        .await
    }

    async fn delete(&self, state: &Value, diags: &mut Diagnostics) {
        let Some(client) = self.client(diags) else {
            return;
        };
        let Some(name) = report(RoleResourceData::from_value(state).and_then(|d| d.role_name()), diags)
        else {
            return;
        };

        info!("Deleting role {}", name);

        match client.remove_role(&name).await {
            Ok(status) => status.append_diagnostics(diags),
            Err(e) => append_client_error(
                diags,
                "Error deleting role",
                &format!("Error occurred deleting role {:?}", name),
                &e,
            ),
        }
    }

    async fn import_state(&self, id: &str, diags: &mut Diagnostics) -> Option<Value> {
        let client = self.client(diags)?;
        if id.trim().is_empty() {
            diags.add_error(
                "Invalid import identifier",
                "Expected the name of an existing role",
            );
            return None;
        }

        match client.read_role(id).await {
            Ok(role) => {
                let data = report(RoleResourceData::from_role(id, &role), diags)?;
                report(data.to_value(), diags)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                diags.add_error("Role not found", format!("Role {:?} not found", id));
                None
            }
            Err(e) => {
                append_client_error(
                    diags,
                    "Error querying for role",
                    &format!("Error occurred querying for role {:?}", id),
                    &e,
                );
                None
            }
        }
    }
}

fn report<T>(result: Result<T>, diags: &mut Diagnostics) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            e.append_diagnostics(diags);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;
    use std::sync::Arc;
    use tfos_client::{IndexPermission, TenantPermission, TransportError};
    use tfos_testing::*;

    const ROLE_PATH: &str = "/_plugins/_security/api/roles/r1";
    const ROLES_PATH: &str = "/_plugins/_security/api/roles/";

    fn resource(mock: &MockTransport) -> RoleResource {
        RoleResource::with_client(SecurityClient::new(Arc::new(mock.clone())))
    }

    fn value(json: serde_json::Value) -> Value {
        Value::from_json(&AttrType::Object(ROLE_SCHEMA.object_type()), &json).unwrap()
    }

    fn stored() -> Role {
        Role {
            reserved: Some(false),
            hidden: Some(false),
            static_: Some(false),
            ..Role::new("Read-only")
                .with_cluster_permission("cluster_composite_ops_ro")
                .with_index_permission(IndexPermission {
                    index_patterns: vec!["logs-*".into()],
                    allowed_actions: vec!["read".into()],
                    ..Default::default()
                })
        }
    }

    fn plan() -> Value {
        value(json!({
            "role_name": "r1",
            "description": "Read-only",
            "cluster_permissions": ["cluster_composite_ops_ro"],
            "index_permissions": [{
                "index_patterns": ["logs-*"],
                "dls": "",
                "fls": "",
                "masked_fields": [],
                "allowed_actions": ["read"]
            }],
            "tenant_permissions": []
        }))
    }

    #[tokio::test]
    async fn test_create_conflict_skips_upsert() {
        let mock = MockTransport::new().with_response(roles_response(200, &[("r1", &stored())]));
        let mut diags = Diagnostics::new();

        let state = resource(&mock).create(&plan(), &mut diags).await;

        assert!(state.is_none());
        assert_eq!(diags.errors().count(), 1);
        let error = diags.errors().next().unwrap();
        assert_eq!(error.summary, "Role already exists");
        assert_eq!(error.detail, "Role \"r1\" already exists in cluster");
        assert_request(&mock.requests()[0], Method::GET, ROLE_PATH);
        assert_no_method(&mock.requests(), Method::PUT);
    }

    #[tokio::test]
    async fn test_create_after_not_found() {
        let mock = MockTransport::new()
            .with_response(role_not_found("r1"))
            .with_response(role_created("r1"))
            .with_response(roles_response(200, &[("r1", &stored())]));
        let mut diags = Diagnostics::new();

        let state = resource(&mock).create(&plan(), &mut diags).await.unwrap();

        assert!(diags.is_empty());
        let requests = mock.requests();
        assert_eq!(requests.len(), 3);
        assert_request(&requests[1], Method::PUT, ROLE_PATH);
        assert_json_body(
            &requests[1],
            &json!({
                "description": "Read-only",
                "cluster_permissions": ["cluster_composite_ops_ro"],
                "index_permissions": [{
                    "index_patterns": ["logs-*"],
                    "dls": "",
                    "fls": "",
                    "masked_fields": [],
                    "allowed_actions": ["read"]
                }],
                "tenant_permissions": []
            }),
        );
        assert_request(&requests[2], Method::GET, ROLES_PATH);

        let state = state.as_object().unwrap();
        assert_eq!(state.bool(attr::RESERVED).unwrap(), Some(false));
        assert_eq!(state.string(attr::ROLE_NAME).unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_create_refused_lookup_is_not_absence() {
        let mock = MockTransport::new()
            .with_response(error_response(403, &[("security_exception", "no permissions")]));
        let mut diags = Diagnostics::new();

        assert!(resource(&mock).create(&plan(), &mut diags).await.is_none());

        let summaries: Vec<_> = diags.errors().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["security_exception", "Status Code Mismatch"]);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_create_rejected_upsert() {
        let mock = MockTransport::new()
            .with_response(role_not_found("r1"))
            .with_response(error_response(400, &[("illegal_argument_exception", "bad action")]));
        let mut diags = Diagnostics::new();

        assert!(resource(&mock).create(&plan(), &mut diags).await.is_none());
        assert_eq!(diags.errors().next().unwrap().summary, "illegal_argument_exception");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_upsert_warnings_are_reported() {
        let mock = MockTransport::new()
            .with_response(role_not_found("r1"))
            .with_response(json_response_with_warnings(
                200,
                &json!({"status": "OK", "message": "'r1' updated."}),
                &["299 OpenSearch \"deprecated action\""],
            ))
            .with_response(roles_response(200, &[("r1", &stored())]));
        let mut diags = Diagnostics::new();

        assert!(resource(&mock).create(&plan(), &mut diags).await.is_some());
        assert!(!diags.has_error());
        assert_eq!(diags.warnings().next().unwrap().summary, "299 OpenSearch \"deprecated action\"");
    }

    #[tokio::test]
    async fn test_read_refreshes_state() {
        let mock = MockTransport::new().with_response(roles_response(200, &[("r1", &stored())]));
        let state = value(json!({"role_name": "r1", "description": "stale"}));
        let mut diags = Diagnostics::new();

        let refreshed = resource(&mock).read(&state, &mut diags).await.unwrap();

        let obj = refreshed.as_object().unwrap();
        assert_eq!(obj.string(attr::DESCRIPTION).unwrap().as_deref(), Some("Read-only"));
        assert_eq!(obj.get(attr::TENANT_PERMISSIONS).unwrap(), &tenant_permissions_to_list(&[], false).unwrap());
        assert_request(&mock.requests()[0], Method::GET, ROLES_PATH);
    }

    #[tokio::test]
    async fn test_read_missing_role_removes_state() {
        let mock = MockTransport::new().with_response(roles_response(200, &[("other", &stored())]));
        let mut diags = Diagnostics::new();

        let state = resource(&mock).read(&plan(), &mut diags).await;

        assert!(state.is_none());
        assert!(!diags.has_error());
        assert_eq!(diags.warnings().next().unwrap().summary, "Role not found");
    }

    #[tokio::test]
    async fn test_read_transport_error() {
        let mock = MockTransport::new().with_error(TransportError::Connection("connection refused".into()));
        let mut diags = Diagnostics::new();

        assert!(resource(&mock).read(&plan(), &mut diags).await.is_none());
        let error = diags.errors().next().unwrap();
        assert_eq!(error.summary, "Error querying for role");
        assert!(error.detail.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_read_garbage_is_a_decode_error() {
        let mock = MockTransport::new().with_response(json_response(200, &json!(["not", "roles"])));
        let mut diags = Diagnostics::new();

        assert!(resource(&mock).read(&plan(), &mut diags).await.is_none());
        assert_eq!(diags.errors().next().unwrap().summary, "Error decoding OpenSearch response");
    }

    #[tokio::test]
    async fn test_update_requires_existing_role() {
        let mock = MockTransport::new().with_response(role_not_found("r1"));
        let mut diags = Diagnostics::new();

        assert!(resource(&mock).update(&plan(), &mut diags).await.is_none());

        let error = diags.errors().next().unwrap();
        assert_eq!(error.summary, "Role not found");
        assert_eq!(error.detail, "Role \"r1\" was not found in cluster");
        assert_no_method(&mock.requests(), Method::PUT);
    }

    #[tokio::test]
    async fn test_update_upserts() {
        let updated = Role {
            description: "Read-write".into(),
            ..stored()
        };
        let mock = MockTransport::new()
            .with_response(roles_response(200, &[("r1", &stored())]))
            .with_response(role_updated("r1"))
            .with_response(roles_response(200, &[("r1", &updated)]));
        let mut diags = Diagnostics::new();

        let state = resource(&mock).update(&plan(), &mut diags).await.unwrap();

        assert!(diags.is_empty());
        assert!(mock.was_called(&Method::PUT, ROLE_PATH));
        assert_eq!(
            state.as_object().unwrap().string(attr::DESCRIPTION).unwrap().as_deref(),
            Some("Read-write")
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let mock = MockTransport::new().with_response(role_deleted("r1"));
        let mut diags = Diagnostics::new();

        resource(&mock).delete(&plan(), &mut diags).await;

        assert!(diags.is_empty());
        assert_request(&mock.requests()[0], Method::DELETE, ROLE_PATH);
    }

    #[tokio::test]
    async fn test_delete_embedded_error() {
        let mock = MockTransport::new().with_response(json_response(
            200,
            &json!({"status": "OK", "error": {"root_cause": [{"type": "x", "reason": "y"}]}}),
        ));
        let mut diags = Diagnostics::new();

        resource(&mock).delete(&plan(), &mut diags).await;

        let errors: Vec<_> = diags.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!((errors[0].summary.as_str(), errors[0].detail.as_str()), ("x", "y"));
    }

    #[tokio::test]
    async fn test_import() {
        let mock = MockTransport::new().with_response(roles_response(200, &[("r1", &stored())]));
        let mut diags = Diagnostics::new();

        let state = resource(&mock).import_state("r1", &mut diags).await.unwrap();

        assert!(diags.is_empty());
        let data = RoleResourceData::from_value(&state).unwrap();
        assert_eq!(data.to_role().unwrap(), stored().without_computed());
        assert_eq!(data.hidden, Value::Bool(false));
    }

    #[tokio::test]
    async fn test_import_missing_role_fails() {
        let mock = MockTransport::new().with_response(roles_response(200, &[]));
        let mut diags = Diagnostics::new();

        assert!(resource(&mock).import_state("r1", &mut diags).await.is_none());
        let error = diags.errors().next().unwrap();
        assert_eq!((error.summary.as_str(), error.detail.as_str()), ("Role not found", "Role \"r1\" not found"));
    }

    #[tokio::test]
    async fn test_unconfigured() {
        let mut role = RoleResource::default();
        let mut diags = Diagnostics::new();

        role.configure(None, &mut diags);
        assert_eq!(diags.warnings().next().unwrap().summary, "Provider is not configured");

        assert!(role.create(&plan(), &mut diags).await.is_none());
        assert_eq!(diags.errors().next().unwrap().summary, "Unconfigured provider");
    }

    #[tokio::test]
    async fn test_schema_mismatch_fails_fast() {
        let mock = MockTransport::new();
        let mut diags = Diagnostics::new();

        assert!(resource(&mock).create(&Value::Bool(true), &mut diags).await.is_none());
        assert_eq!(diags.errors().next().unwrap().summary, "Provider schema mismatch");
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_from_role_empty_lists() {
        let data = RoleResourceData::from_role("r1", &Role::new("d")).unwrap();

        assert!(data.cluster_permissions.is_null());
        assert_eq!(data.index_permissions.as_list().map(|l| l.len()), Some(0));
        assert_eq!(data.tenant_permissions.as_list().map(|l| l.len()), Some(0));
        assert!(data.reserved.is_null());
        assert!(data.to_value().is_ok());
    }

    #[test]
    fn test_to_role_round_trip() {
        let role = Role::new("d").with_tenant_permission(TenantPermission {
            tenant_patterns: vec!["global_tenant".into()],
            allowed_actions: vec!["kibana_all_write".into()],
        });
        let data = RoleResourceData::from_role("r1", &role).unwrap();
        assert_eq!(data.to_role().unwrap(), role);
    }

    #[test]
    fn test_type_name() {
        assert_eq!(
            RoleResource::default().type_name("opensearch"),
            "opensearch_security_plugin_role"
        );
    }
}
