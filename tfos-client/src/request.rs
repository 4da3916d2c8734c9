//! Transport-neutral request descriptor.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::Method;

/// Media type used for JSON request bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// An HTTP request that has been built but not yet performed.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the cluster address, starting with `/`.
    pub path: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
}

impl ApiRequest {
    /// Create a request with no headers and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Create a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Create a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Merge caller headers. Every value is kept, including repeats.
    pub fn with_headers(mut self, headers: Option<&HeaderMap>) -> Self {
        if let Some(headers) = headers {
            for (name, value) in headers {
                self.headers.append(name.clone(), value.clone());
            }
        }
        self
    }

    /// Attach a JSON body.
    ///
    /// `Content-Type: application/json` is added unless a content type has
    /// already been supplied, in which case the supplied one is kept.
    pub fn with_json_body(mut self, body: Bytes) -> Self {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }
        self.body = Some(body);
        self
    }

    /// Length of the body, zero when absent.
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_appended() {
        let mut caller = HeaderMap::new();
        caller.append("x-opaque-id", HeaderValue::from_static("a"));
        caller.append("x-opaque-id", HeaderValue::from_static("b"));

        let req = ApiRequest::get("/")
            .with_headers(Some(&caller))
            .with_headers(Some(&caller));

        let values: Vec<_> = req.headers.get_all("x-opaque-id").iter().collect();
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let req = ApiRequest::put("/x").with_json_body(Bytes::from_static(b"{}"));
        assert_eq!(req.headers.get(CONTENT_TYPE).unwrap(), APPLICATION_JSON);
        assert_eq!(req.body_len(), 2);
    }

    #[test]
    fn test_caller_content_type_is_kept() {
        let mut caller = HeaderMap::new();
        caller.insert(CONTENT_TYPE, HeaderValue::from_static("application/vnd.custom+json"));

        let req = ApiRequest::put("/x")
            .with_headers(Some(&caller))
            .with_json_body(Bytes::from_static(b"{}"));

        let values: Vec<_> = req.headers.get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values, vec!["application/vnd.custom+json"]);
    }
}
