//! Wire model for security-plugin roles.
//!
//! The role name is never part of a role body. It travels in the URL path
//! or as the key of a role collection.

use serde::{Deserialize, Deserializer, Serialize};

/// A security-plugin role definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Free-form description.
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,

    /// Cluster-wide permissions, in order.
    #[serde(default, deserialize_with = "null_default")]
    pub cluster_permissions: Vec<String>,

    /// Per-index permissions, in order.
    #[serde(default, deserialize_with = "null_default")]
    pub index_permissions: Vec<IndexPermission>,

    /// Per-tenant permissions, in order.
    #[serde(default, deserialize_with = "null_default")]
    pub tenant_permissions: Vec<TenantPermission>,

    /// Set by the cluster; only present on reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved: Option<bool>,

    /// Set by the cluster; only present on reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Set by the cluster; only present on reads.
    #[serde(
        rename = "static",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub static_: Option<bool>,
}

impl Role {
    /// Create an empty role with a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Add a cluster permission.
    pub fn with_cluster_permission(mut self, permission: impl Into<String>) -> Self {
        self.cluster_permissions.push(permission.into());
        self
    }

    /// Add an index permission.
    pub fn with_index_permission(mut self, permission: IndexPermission) -> Self {
        self.index_permissions.push(permission);
        self
    }

    /// Add a tenant permission.
    pub fn with_tenant_permission(mut self, permission: TenantPermission) -> Self {
        self.tenant_permissions.push(permission);
        self
    }

    /// Copy of this role without the cluster-computed flags.
    ///
    /// The flags are rejected by the upsert endpoint.
    pub fn without_computed(&self) -> Self {
        Self {
            reserved: None,
            hidden: None,
            static_: None,
            ..self.clone()
        }
    }
}

/// Permissions granted on a set of index patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPermission {
    /// Index name globs.
    #[serde(default, deserialize_with = "null_default")]
    pub index_patterns: Vec<String>,

    /// Document-level security query.
    #[serde(default, deserialize_with = "null_default")]
    pub dls: String,

    /// Field-level security filter.
    #[serde(default, deserialize_with = "null_default")]
    pub fls: String,

    /// Fields masked in results.
    #[serde(default, deserialize_with = "null_default")]
    pub masked_fields: Vec<String>,

    /// Permitted actions.
    #[serde(default, deserialize_with = "null_default")]
    pub allowed_actions: Vec<String>,
}

/// Permissions granted on a set of tenant patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantPermission {
    /// Tenant name globs.
    #[serde(default, deserialize_with = "null_default")]
    pub tenant_patterns: Vec<String>,

    /// Permitted actions.
    #[serde(default, deserialize_with = "null_default")]
    pub allowed_actions: Vec<String>,
}

// The security API writes `null` for lists it has never seen set.
fn null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_body_has_no_name_or_unset_flags() {
        let role = Role::new("readers").with_cluster_permission("cluster_composite_ops_ro");
        let value = serde_json::to_value(&role).unwrap();

        assert_eq!(
            value,
            json!({
                "description": "readers",
                "cluster_permissions": ["cluster_composite_ops_ro"],
                "index_permissions": [],
                "tenant_permissions": []
            })
        );
    }

    #[test]
    fn test_role_decodes_computed_flags() {
        let role: Role = serde_json::from_value(json!({
            "reserved": true,
            "hidden": false,
            "static": true,
            "description": "Allow full access",
            "cluster_permissions": ["*"],
            "index_permissions": [{
                "index_patterns": ["*"],
                "dls": "",
                "fls": "",
                "masked_fields": null,
                "allowed_actions": ["*"]
            }],
            "tenant_permissions": [{"tenant_patterns": ["*"], "allowed_actions": ["kibana_all_write"]}]
        }))
        .unwrap();

        assert_eq!(role.reserved, Some(true));
        assert_eq!(role.hidden, Some(false));
        assert_eq!(role.static_, Some(true));
        assert!(role.index_permissions[0].masked_fields.is_empty());
        assert_eq!(role.tenant_permissions[0].allowed_actions, vec!["kibana_all_write"]);
    }

    #[test]
    fn test_role_json_shape_is_stable() {
        let role = Role::new("d1").with_index_permission(IndexPermission {
            index_patterns: vec!["logs-*".to_string()],
            dls: r#"{"term": {"public": true}}"#.to_string(),
            allowed_actions: vec!["read".to_string()],
            ..IndexPermission::default()
        });

        let encoded = serde_json::to_vec(&role).unwrap();
        let decoded: Role = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, role);
    }

    #[test]
    fn test_without_computed() {
        let role = Role {
            reserved: Some(false),
            static_: Some(true),
            ..Role::new("d")
        };
        let stripped = role.without_computed();
        assert_eq!(stripped.reserved, None);
        assert_eq!(stripped.static_, None);
        assert_eq!(stripped.description, "d");
    }
}
