//! Response classification.
//!
//! [`parse_response`] compares the response status with the accepted
//! codes. An accepted response is decoded into the requested sink. Any
//! other response is decoded as a [`StatusEnvelope`] and returned as an
//! error carrying a synthesized "Status Code Mismatch" root cause. The body
//! is closed exactly once on every path.

use crate::envelope::{decode_envelope, decode_status, Envelope, RootCause, StatusEnvelope};
use crate::error::{ClientError, DecodeError};
use crate::model::Role;
use crate::response::{ApiResponse, ResponseBody};
use serde::de::DeserializeOwned;

/// Destination for a successfully classified response body.
pub trait ResponseSink: Sized + Send {
    /// Whether the body is read at all.
    const READS_BODY: bool = true;

    /// Decode the body.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError>;

    /// Receive header-sourced warnings. Ignored by sinks without a place
    /// to put them.
    fn attach_warnings(&mut self, _warnings: Vec<String>) {}
}

/// Discard the body.
impl ResponseSink for () {
    const READS_BODY: bool = false;

    fn decode(_bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(())
    }
}

impl ResponseSink for StatusEnvelope {
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        decode_status(bytes)
    }

    fn attach_warnings(&mut self, warnings: Vec<String>) {
        self.set_warnings(warnings);
    }
}

impl ResponseSink for Role {
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(bytes).map_err(DecodeError::Body)
    }
}

impl<T: DeserializeOwned + Send> ResponseSink for Envelope<T> {
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        decode_envelope(bytes)
    }

    fn attach_warnings(&mut self, warnings: Vec<String>) {
        if let Envelope::Status(status) = self {
            status.set_warnings(warnings);
        }
    }
}

/// Closes the wrapped body when dropped.
struct BodyGuard {
    body: Box<dyn ResponseBody>,
}

impl Drop for BodyGuard {
    fn drop(&mut self) {
        // A close failure must not mask the classification outcome.
        if let Err(e) = self.body.close() {
            tfos_log::debug!("Ignoring error closing response body: {}", e);
        }
    }
}

/// Classify `response` against the `accepted` status codes.
///
/// # Errors
///
/// - [`ClientError::StatusMismatch`] when the status is not accepted. The envelope
///   ends with a "Status Code Mismatch" root cause naming the actual and
///   accepted codes.
/// - [`ClientError::Decode`] when the body is malformed, on either path.
/// - [`ClientError::Transport`] when the body cannot be read.
pub async fn parse_response<S: ResponseSink>(
    response: ApiResponse,
    accepted: &[u16],
) -> Result<S, ClientError> {
    let warnings = response.warnings();
    let (status, _headers, body) = response.into_parts();
    let mut guard = BodyGuard { body };

    if accepted.contains(&status.as_u16()) {
        if !S::READS_BODY {
            return S::decode(&[]).map_err(ClientError::from);
        }
        let bytes = guard.body.read_all().await?;
        let mut sink = S::decode(&bytes)?;
        if !warnings.is_empty() {
            sink.attach_warnings(warnings);
        }
        return Ok(sink);
    }

    let bytes = guard.body.read_all().await?;
    let mut envelope = decode_status(&bytes)?;
    envelope.set_warnings(warnings);
    envelope.push_cause(RootCause::status_mismatch(status.as_u16(), accepted));

    tfos_log::debug!(
        "Unexpected response status {}: {}",
        status.as_u16(),
        envelope.summary()
    );

    Err(ClientError::StatusMismatch(envelope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::STATUS_CODE_MISMATCH;
    use crate::error::{ErrorKind, TransportError};
    use crate::response::BufferedBody;
    use async_trait::async_trait;
    use bytes::Bytes;
    use http::header::WARNING;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingBody {
        inner: BufferedBody,
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    #[async_trait]
    impl ResponseBody for CountingBody {
        async fn read_all(&mut self) -> Result<Bytes, TransportError> {
            self.inner.read_all().await
        }

        fn close(&mut self) -> io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                Err(io::Error::other("close failed"))
            } else {
                Ok(())
            }
        }
    }

    fn response(status: u16, body: &'static str, headers: HeaderMap) -> (ApiResponse, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let body = CountingBody {
            inner: BufferedBody::new(body),
            closes: closes.clone(),
            fail_close: false,
        };
        let resp = ApiResponse::new(StatusCode::from_u16(status).unwrap(), headers, Box::new(body));
        (resp, closes)
    }

    #[tokio::test]
    async fn test_match_without_sink_skips_decode() {
        let (resp, closes) = response(200, "not json", HeaderMap::new());
        parse_response::<()>(resp, &[200]).await.unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_match_decodes_sink_and_warnings() {
        let mut headers = HeaderMap::new();
        headers.append(WARNING, HeaderValue::from_static("w1"));
        headers.append(WARNING, HeaderValue::from_static("w2"));
        let (resp, closes) = response(200, r#"{"status":"OK","message":"'r1' updated."}"#, headers);

        let status: StatusEnvelope = parse_response(resp, &[200]).await.unwrap();
        assert_eq!(status.status, "OK");
        assert_eq!(status.warnings(), &["w1".to_string(), "w2".to_string()]);
        assert!(!status.has_errors());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_match_decodes_collection() {
        let (resp, _) = response(200, r#"{"r1":{"description":"d1"}}"#, HeaderMap::new());
        let roles: Envelope<Role> = parse_response(resp, &[200]).await.unwrap();
        assert_eq!(roles.get("r1").map(|r| r.description.as_str()), Some("d1"));
    }

    #[tokio::test]
    async fn test_mismatch_synthesizes_cause() {
        let (resp, closes) = response(404, r#"{"status":"NOT_FOUND","message":"Resource 'r1' not found."}"#, HeaderMap::new());

        let err = parse_response::<Envelope<Role>>(resp, &[200]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StatusMismatch);

        let envelope = err.envelope().unwrap();
        assert_eq!(envelope.status, "NOT_FOUND");
        assert_eq!(envelope.root_causes().len(), 1);
        let cause = &envelope.root_causes()[0];
        assert_eq!(cause.kind, STATUS_CODE_MISMATCH);
        assert!(cause.reason.contains("404"));
        assert!(cause.reason.contains("200"));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mismatch_appends_after_cluster_causes() {
        let body = r#"{"error":{"root_cause":[{"type":"security_exception","reason":"no permissions"}]},"status":403}"#;
        let (resp, _) = response(403, body, HeaderMap::new());

        let err = parse_response::<()>(resp, &[200]).await.unwrap_err();
        let causes = err.envelope().unwrap().root_causes();
        assert_eq!(causes.len(), 2);
        assert_eq!(causes[0].kind, "security_exception");
        assert_eq!(causes[1].kind, STATUS_CODE_MISMATCH);
    }

    #[tokio::test]
    async fn test_mismatch_with_empty_body() {
        let (resp, closes) = response(502, "", HeaderMap::new());
        let err = parse_response::<()>(resp, &[200]).await.unwrap_err();
        assert_eq!(err.envelope().unwrap().root_causes().len(), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error_on_both_paths() {
        let (resp, closes) = response(200, "{oops", HeaderMap::new());
        let err = parse_response::<StatusEnvelope>(resp, &[200]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let (resp, closes) = response(500, "<html>", HeaderMap::new());
        let err = parse_response::<StatusEnvelope>(resp, &[200]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_failure_is_swallowed() {
        let closes = Arc::new(AtomicUsize::new(0));
        let body = CountingBody {
            inner: BufferedBody::new("{}"),
            closes: closes.clone(),
            fail_close: true,
        };
        let resp = ApiResponse::new(StatusCode::OK, HeaderMap::new(), Box::new(body));

        let status: StatusEnvelope = parse_response(resp, &[200]).await.unwrap();
        assert!(!status.is_populated());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
