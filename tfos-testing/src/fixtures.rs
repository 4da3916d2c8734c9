// Response fixtures shaped like the security plugin's replies

use crate::mock::status_code;
use http::header::{HeaderValue, CONTENT_TYPE, WARNING};
use http::HeaderMap;
use serde::Serialize;
use serde_json::json;
use tfos_client::{ApiResponse, Role};

/// Response with a JSON body
pub fn json_response<T: Serialize>(status: u16, body: &T) -> ApiResponse {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    ApiResponse::buffered(status_code(status), json_headers(), bytes)
}

/// Response with a JSON body and `Warning` headers
pub fn json_response_with_warnings<T: Serialize>(
    status: u16,
    body: &T,
    warnings: &[&str],
) -> ApiResponse {
    let mut response = json_response(status, body);
    for warning in warnings {
        if let Ok(value) = HeaderValue::from_str(warning) {
            response.headers.append(WARNING, value);
        }
    }
    response
}

/// Status report such as `{"status":"OK","message":"..."}`
pub fn status_response(status: u16, status_text: &str, message: &str) -> ApiResponse {
    json_response(status, &json!({ "status": status_text, "message": message }))
}

/// Error report with root causes, in order
pub fn error_response(status: u16, causes: &[(&str, &str)]) -> ApiResponse {
    let root_cause: Vec<_> = causes
        .iter()
        .map(|(kind, reason)| json!({ "type": kind, "reason": reason }))
        .collect();
    json_response(status, &json!({ "error": { "root_cause": root_cause }, "status": status }))
}

/// Role collection keyed by name
pub fn roles_response(status: u16, roles: &[(&str, &Role)]) -> ApiResponse {
    let map: serde_json::Map<_, _> = roles
        .iter()
        .map(|(name, role)| {
            (
                (*name).to_string(),
                serde_json::to_value(role).unwrap_or_default(),
            )
        })
        .collect();
    json_response(status, &map)
}

/// 404 reply of the single-role endpoint
pub fn role_not_found(name: &str) -> ApiResponse {
    status_response(404, "NOT_FOUND", &format!("Resource '{}' not found.", name))
}

/// 201 reply to a role upsert that created the role
pub fn role_created(name: &str) -> ApiResponse {
    status_response(201, "CREATED", &format!("'{}' created.", name))
}

/// 200 reply to a role upsert that replaced the role
pub fn role_updated(name: &str) -> ApiResponse {
    status_response(200, "OK", &format!("'{}' updated.", name))
}

/// 200 reply to a role delete
pub fn role_deleted(name: &str) -> ApiResponse {
    status_response(200, "OK", &format!("'{}' deleted.", name))
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=UTF-8"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfos_client::{parse_response, RoleCollection, StatusEnvelope};

    #[tokio::test]
    async fn test_roles_response_decodes() {
        let role = Role::new("d1");
        let roles: RoleCollection = parse_response(roles_response(200, &[("r1", &role)]), &[200])
            .await
            .unwrap();
        assert_eq!(roles.get("r1"), Some(&role));
    }

    #[tokio::test]
    async fn test_error_response_keeps_cause_order() {
        let err = parse_response::<StatusEnvelope>(error_response(400, &[("A", "a"), ("B", "b")]), &[200])
            .await
            .unwrap_err();
        let causes = err.envelope().unwrap().root_causes();
        assert_eq!(causes[0].kind, "A");
        assert_eq!(causes[1].kind, "B");
    }

    #[test]
    fn test_warnings_are_headers() {
        let response = json_response_with_warnings(200, &json!({}), &["w1", "w2"]);
        assert_eq!(response.warnings(), vec!["w1", "w2"]);
    }
}
