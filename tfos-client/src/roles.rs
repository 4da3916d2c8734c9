//! Request builders for the security-plugin roles API.
//!
//! Builders are pure: they describe a request and never perform it. Names
//! are not validated here; the cluster rejects malformed ones.

use crate::error::{ClientError, Result};
use crate::model::Role;
use crate::request::ApiRequest;
use bytes::Bytes;
use http::HeaderMap;

/// Base path of the roles API.
pub const ROLES_PATH: &str = "/_plugins/_security/api/roles/";

/// Path of a single role.
pub fn role_path(name: &str) -> String {
    format!("{ROLES_PATH}{name}")
}

/// `GET /_plugins/_security/api/roles/{name}`
pub fn get_role(name: &str, headers: Option<&HeaderMap>) -> ApiRequest {
    ApiRequest::get(role_path(name)).with_headers(headers)
}

/// `GET /_plugins/_security/api/roles/`
pub fn get_roles(headers: Option<&HeaderMap>) -> ApiRequest {
    ApiRequest::get(ROLES_PATH).with_headers(headers)
}

/// `PUT /_plugins/_security/api/roles/{name}` with a pre-encoded body.
pub fn upsert_role(name: &str, body: Option<Bytes>, headers: Option<&HeaderMap>) -> ApiRequest {
    let request = ApiRequest::put(role_path(name)).with_headers(headers);
    match body {
        Some(body) => request.with_json_body(body),
        None => request,
    }
}

/// `PUT /_plugins/_security/api/roles/{name}` with `role` encoded as JSON.
///
/// Cluster-computed flags are dropped from the body.
pub fn upsert_role_json(name: &str, role: &Role, headers: Option<&HeaderMap>) -> Result<ApiRequest> {
    let body = serde_json::to_vec(&role.without_computed()).map_err(ClientError::Encode)?;
    Ok(upsert_role(name, Some(Bytes::from(body)), headers))
}

/// `DELETE /_plugins/_security/api/roles/{name}`
pub fn delete_role(name: &str, headers: Option<&HeaderMap>) -> ApiRequest {
    ApiRequest::delete(role_path(name)).with_headers(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderValue, CONTENT_TYPE};
    use http::Method;

    #[test]
    fn test_paths_and_methods() {
        let req = get_role("readers", None);
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/_plugins/_security/api/roles/readers");
        assert!(req.body.is_none());

        let req = get_roles(None);
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/_plugins/_security/api/roles/");

        let req = delete_role("readers", None);
        assert_eq!(req.method, Method::DELETE);
        assert_eq!(req.path, "/_plugins/_security/api/roles/readers");
    }

    #[test]
    fn test_upsert_body_excludes_name_and_flags() {
        let role = Role {
            reserved: Some(false),
            ..Role::new("d1")
        };
        let req = upsert_role_json("r1", &role, None).unwrap();

        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.path, "/_plugins/_security/api/roles/r1");
        assert_eq!(req.headers.get(CONTENT_TYPE).unwrap(), "application/json");

        let body: serde_json::Value = serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
        let obj = body.as_object().unwrap();
        assert_eq!(obj["description"], "d1");
        assert!(!obj.contains_key("reserved"));
        assert!(!obj.values().any(|v| v == "r1"));
    }

    #[test]
    fn test_upsert_without_body() {
        let req = upsert_role("r1", None, None);
        assert!(req.body.is_none());
        assert!(req.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_caller_headers_flow_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-opaque-id", HeaderValue::from_static("tf-apply"));

        let req = get_roles(Some(&headers));
        assert_eq!(req.headers.get("x-opaque-id").unwrap(), "tf-apply");
    }
}
