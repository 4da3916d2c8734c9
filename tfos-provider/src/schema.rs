//! Provider and resource schemas.
//!
//! Every attribute name, type and mode lives here. The attribute mapper and
//! the resource data conversions look attributes up through these
//! definitions, so a rename in one place cannot silently miss the other.

use crate::error::{AttrError, Result};
use crate::modifiers::{DefaultEmptyList, DefaultString, PlanModifier};
use crate::types::{AttrType, ObjectType, ObjectValue, Value};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Provider type name
pub const PROVIDER_NAME: &str = "opensearch";

/// Resource type suffix of security plugin roles
pub const RESOURCE_TYPE_SECURITY_PLUGIN_ROLE: &str = "security_plugin_role";

/// Attribute names
pub mod attr {
    // provider block
    pub const ADDRESSES: &str = "addresses";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const CA_CERT: &str = "ca_cert";
    pub const RETRY_ON_STATUS: &str = "retry_on_status";
    pub const DISABLE_RETRY: &str = "disable_retry";
    pub const ENABLE_RETRY_ON_TIMEOUT: &str = "enable_retry_on_timeout";
    pub const MAX_RETRIES: &str = "max_retries";
    pub const COMPRESS_REQUEST_BODY: &str = "compress_request_body";
    pub const INSECURE_SKIP_TLS_VERIFY: &str = "insecure_skip_tls_verify";
    pub const USE_RESPONSE_CHECK_ONLY: &str = "use_response_check_only";
    pub const SKIP_INIT_PRODUCT_CHECK: &str = "skip_init_product_check";
    pub const LOGGING: &str = "logging";
    pub const ENABLED: &str = "enabled";
    pub const INCLUDE_REQUEST_BODY: &str = "include_request_body";
    pub const INCLUDE_RESPONSE_BODY: &str = "include_response_body";

    // role resource
    pub const ROLE_NAME: &str = "role_name";
    pub const DESCRIPTION: &str = "description";
    pub const CLUSTER_PERMISSIONS: &str = "cluster_permissions";
    pub const INDEX_PERMISSIONS: &str = "index_permissions";
    pub const TENANT_PERMISSIONS: &str = "tenant_permissions";
    pub const INDEX_PATTERNS: &str = "index_patterns";
    pub const DLS: &str = "dls";
    pub const FLS: &str = "fls";
    pub const MASKED_FIELDS: &str = "masked_fields";
    pub const ALLOWED_ACTIONS: &str = "allowed_actions";
    pub const TENANT_PATTERNS: &str = "tenant_patterns";
    pub const RESERVED: &str = "reserved";
    pub const HIDDEN: &str = "hidden";
    pub const STATIC: &str = "static";
}

/// `{provider}_{suffix}`
pub fn type_name(provider: &str, suffix: &str) -> String {
    format!("{}_{}", provider, suffix)
}

/// Address of a resource instance in configuration, `{type}.{name}`.
pub fn resource_type_fqn(provider: &str, suffix: &str, name: &str) -> String {
    format!("{}.{}", type_name(provider, suffix), name)
}

/// Address of a data source instance, `data.{type}.{name}`.
pub fn datasource_type_fqn(provider: &str, suffix: &str, name: &str) -> String {
    format!("data.{}.{}", type_name(provider, suffix), name)
}

/// Who supplies an attribute's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeMode {
    /// Configuration must set it
    Required,
    /// Configuration may set it
    Optional,
    /// Only the provider sets it
    Computed,
}

/// One attribute definition
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub ty: AttrType,
    pub mode: AttributeMode,
    pub sensitive: bool,
    pub description: &'static str,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
}

impl AttributeSchema {
    fn new(name: &'static str, ty: AttrType, mode: AttributeMode) -> Self {
        Self {
            name,
            ty,
            mode,
            sensitive: false,
            description: "",
            plan_modifiers: Vec::new(),
        }
    }

    fn required(name: &'static str, ty: AttrType) -> Self {
        Self::new(name, ty, AttributeMode::Required)
    }

    fn optional(name: &'static str, ty: AttrType) -> Self {
        Self::new(name, ty, AttributeMode::Optional)
    }

    fn computed(name: &'static str, ty: AttrType) -> Self {
        Self::new(name, ty, AttributeMode::Computed)
    }

    fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn modified_by(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.plan_modifiers.push(Arc::new(modifier));
        self
    }
}

/// Schema of a provider block or resource
#[derive(Debug, Clone)]
pub struct Schema {
    pub description: &'static str,
    pub attributes: Vec<AttributeSchema>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Object type of a whole configuration, plan or state.
    pub fn object_type(&self) -> ObjectType {
        self.attributes
            .iter()
            .fold(ObjectType::new(), |ty, a| ty.with(a.name, a.ty.clone()))
    }

    /// Check that `value` is an object of this schema with every required
    /// attribute set.
    pub fn check<'a>(&self, value: &'a Value) -> Result<&'a ObjectValue> {
        let obj = value.as_object().ok_or(AttrError::NotAnObject)?;
        if obj.object_type() != &self.object_type() {
            return Err(AttrError::mismatch(
                "",
                AttrType::Object(self.object_type()),
                value.ty(),
            ));
        }
        for attribute in &self.attributes {
            if attribute.mode == AttributeMode::Required && !obj.get(attribute.name)?.is_known() {
                return Err(AttrError::NullValue(attribute.name.to_string()));
            }
        }
        Ok(obj)
    }

    /// Run every attribute's plan modifiers over a planned object.
    pub fn modify_plan(&self, plan: &Value) -> Result<Value> {
        let mut obj = plan.as_object().ok_or(AttrError::NotAnObject)?.clone();
        for attribute in &self.attributes {
            if attribute.plan_modifiers.is_empty() {
                continue;
            }
            let planned = attribute
                .plan_modifiers
                .iter()
                .fold(obj.get(attribute.name)?.clone(), |value, m| m.modify(value));
            obj.set(attribute.name, planned)?;
        }
        Ok(Value::Object(obj))
    }
}

/// Element type of `index_permissions`
pub static INDEX_PERMISSION_TYPE: Lazy<ObjectType> = Lazy::new(|| {
    ObjectType::new()
        .with(attr::INDEX_PATTERNS, AttrType::list(AttrType::String))
        .with(attr::DLS, AttrType::String)
        .with(attr::FLS, AttrType::String)
        .with(attr::MASKED_FIELDS, AttrType::list(AttrType::String))
        .with(attr::ALLOWED_ACTIONS, AttrType::list(AttrType::String))
});

/// Element type of `tenant_permissions`
pub static TENANT_PERMISSION_TYPE: Lazy<ObjectType> = Lazy::new(|| {
    ObjectType::new()
        .with(attr::TENANT_PATTERNS, AttrType::list(AttrType::String))
        .with(attr::ALLOWED_ACTIONS, AttrType::list(AttrType::String))
});

/// Type of the provider's `logging` block
pub static LOGGING_TYPE: Lazy<ObjectType> = Lazy::new(|| {
    ObjectType::new()
        .with(attr::ENABLED, AttrType::Bool)
        .with(attr::INCLUDE_REQUEST_BODY, AttrType::Bool)
        .with(attr::INCLUDE_RESPONSE_BODY, AttrType::Bool)
});

/// `opensearch_security_plugin_role`
pub static ROLE_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    let index_permission = AttrType::Object(INDEX_PERMISSION_TYPE.clone());
    let tenant_permission = AttrType::Object(TENANT_PERMISSION_TYPE.clone());

    Schema {
        description: "OpenSearch Security Plugin Role",
        attributes: vec![
            AttributeSchema::required(attr::ROLE_NAME, AttrType::String),
            AttributeSchema::optional(attr::DESCRIPTION, AttrType::String)
                .modified_by(DefaultString("")),
            AttributeSchema::optional(attr::CLUSTER_PERMISSIONS, AttrType::list(AttrType::String)),
            AttributeSchema::optional(attr::INDEX_PERMISSIONS, AttrType::list(index_permission.clone()))
                .modified_by(DefaultEmptyList::new(index_permission)),
            AttributeSchema::optional(attr::TENANT_PERMISSIONS, AttrType::list(tenant_permission.clone()))
                .modified_by(DefaultEmptyList::new(tenant_permission)),
            AttributeSchema::computed(attr::STATIC, AttrType::Bool),
            AttributeSchema::computed(attr::HIDDEN, AttrType::Bool),
            AttributeSchema::computed(attr::RESERVED, AttrType::Bool),
        ],
    }
});

/// Provider block
pub static PROVIDER_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema {
    description: "OpenSearch Provider",
    attributes: vec![
        AttributeSchema::optional(attr::ADDRESSES, AttrType::list(AttrType::String))
            .describe("List of addresses to connect to"),
        AttributeSchema::optional(attr::USERNAME, AttrType::String)
            .describe("Username for HTTP basic authentication"),
        AttributeSchema::optional(attr::PASSWORD, AttrType::String)
            .sensitive()
            .describe("Password for HTTP basic authentication"),
        AttributeSchema::optional(attr::CA_CERT, AttrType::String)
            .sensitive()
            .describe("PEM Encoded certificate authorities"),
        AttributeSchema::optional(attr::RETRY_ON_STATUS, AttrType::list(AttrType::Int64))
            .describe("List of status codes for retry"),
        AttributeSchema::optional(attr::DISABLE_RETRY, AttrType::Bool)
            .describe("Disable all request retries"),
        AttributeSchema::optional(attr::ENABLE_RETRY_ON_TIMEOUT, AttrType::Bool)
            .describe("Enables request retry on timeout"),
        AttributeSchema::optional(attr::MAX_RETRIES, AttrType::Int64)
            .describe("Maximum number of times a given request can be retried"),
        AttributeSchema::optional(attr::COMPRESS_REQUEST_BODY, AttrType::Bool)
            .describe("Enable request body compression"),
        AttributeSchema::optional(attr::INSECURE_SKIP_TLS_VERIFY, AttrType::Bool)
            .describe("Disable TLS verification"),
        AttributeSchema::optional(attr::USE_RESPONSE_CHECK_ONLY, AttrType::Bool)
            .describe("Disable executing product check on every request"),
        AttributeSchema::optional(attr::SKIP_INIT_PRODUCT_CHECK, AttrType::Bool)
            .describe("Skip product check API call on configure"),
        AttributeSchema::optional(attr::LOGGING, AttrType::Object(LOGGING_TYPE.clone()))
            .describe("OpenSearch client logging configuration"),
    ],
});

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_names() {
        assert_eq!(
            type_name(PROVIDER_NAME, RESOURCE_TYPE_SECURITY_PLUGIN_ROLE),
            "opensearch_security_plugin_role"
        );
        assert_eq!(
            resource_type_fqn(PROVIDER_NAME, RESOURCE_TYPE_SECURITY_PLUGIN_ROLE, "readers"),
            "opensearch_security_plugin_role.readers"
        );
        assert_eq!(
            datasource_type_fqn(PROVIDER_NAME, RESOURCE_TYPE_SECURITY_PLUGIN_ROLE, "readers"),
            "data.opensearch_security_plugin_role.readers"
        );
    }

    #[test]
    fn test_sensitive_attributes() {
        let sensitive: Vec<_> = PROVIDER_SCHEMA
            .attributes
            .iter()
            .filter(|a| a.sensitive)
            .map(|a| a.name)
            .collect();
        assert_eq!(sensitive, vec![attr::PASSWORD, attr::CA_CERT]);
    }

    #[test]
    fn test_role_flags_are_computed() {
        for name in [attr::RESERVED, attr::HIDDEN, attr::STATIC] {
            assert_eq!(ROLE_SCHEMA.attribute(name).unwrap().mode, AttributeMode::Computed);
        }
    }

    #[test]
    fn test_check_requires_role_name() {
        let ty = AttrType::Object(ROLE_SCHEMA.object_type());
        let value = Value::from_json(&ty, &json!({"description": "d"})).unwrap();
        assert_eq!(
            ROLE_SCHEMA.check(&value).unwrap_err(),
            AttrError::NullValue(attr::ROLE_NAME.into())
        );

        let value = Value::from_json(&ty, &json!({"role_name": "r1"})).unwrap();
        assert!(ROLE_SCHEMA.check(&value).is_ok());
    }

    #[test]
    fn test_modify_plan_fills_defaults() {
        let ty = AttrType::Object(ROLE_SCHEMA.object_type());
        let plan = Value::from_json(&ty, &json!({"role_name": "r1"})).unwrap();

        let planned = ROLE_SCHEMA.modify_plan(&plan).unwrap();
        let obj = planned.as_object().unwrap();

        assert_eq!(obj.string(attr::DESCRIPTION).unwrap().as_deref(), Some(""));
        assert_eq!(obj.get(attr::INDEX_PERMISSIONS).unwrap().as_list().map(|l| l.len()), Some(0));
        assert_eq!(obj.get(attr::TENANT_PERMISSIONS).unwrap().as_list().map(|l| l.len()), Some(0));
        assert!(obj.get(attr::CLUSTER_PERMISSIONS).unwrap().is_null());
    }
}
