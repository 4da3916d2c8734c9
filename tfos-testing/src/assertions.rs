// Assertions for recorded requests

use http::Method;
use tfos_client::ApiRequest;

/// Assert that a request has a specific method and path
pub fn assert_request(request: &ApiRequest, method: Method, path: &str) {
    assert_eq!(
        (&request.method, request.path.as_str()),
        (&method, path),
        "Expected {} {}, got {} {}",
        method,
        path,
        request.method,
        request.path
    );
}

/// Assert that a request carries a header value
pub fn assert_header(request: &ApiRequest, key: &str, expected: &str) {
    let actual = request.headers.get(key).and_then(|v| v.to_str().ok());
    assert_eq!(
        actual,
        Some(expected),
        "Expected header '{}' to be '{}', got {:?}",
        key,
        expected,
        actual
    );
}

/// Assert that a request body is JSON equal to `expected`
pub fn assert_json_body(request: &ApiRequest, expected: &serde_json::Value) {
    let body = request
        .body
        .as_ref()
        .unwrap_or_else(|| panic!("Expected a body on {} {}", request.method, request.path));
    let actual: serde_json::Value =
        serde_json::from_slice(body).unwrap_or_else(|e| panic!("Request body is not JSON: {}", e));
    assert_eq!(&actual, expected, "JSON bodies do not match");
}

/// Assert that no request in `requests` used `method`
pub fn assert_no_method(requests: &[ApiRequest], method: Method) {
    let offending: Vec<_> = requests
        .iter()
        .filter(|r| r.method == method)
        .map(|r| r.path.as_str())
        .collect();
    assert!(
        offending.is_empty(),
        "Expected no {} requests, got {:?}",
        method,
        offending
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_request_assertions() {
        let request = ApiRequest::put("/_plugins/_security/api/roles/r1")
            .with_json_body(Bytes::from_static(br#"{"description":"d"}"#));

        assert_request(&request, Method::PUT, "/_plugins/_security/api/roles/r1");
        assert_header(&request, "content-type", "application/json");
        assert_json_body(&request, &serde_json::json!({"description": "d"}));
        assert_no_method(std::slice::from_ref(&request), Method::DELETE);
    }

    #[test]
    #[should_panic(expected = "Expected no PUT requests")]
    fn test_assert_no_method_panics() {
        let request = ApiRequest::put("/x");
        assert_no_method(&[request], Method::PUT);
    }
}
