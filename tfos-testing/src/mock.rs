// Mock transports and bodies for testing

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tfos_client::{ApiRequest, ApiResponse, ResponseBody, Transport, TransportError};

type Reply = Result<ApiResponse, TransportError>;

/// Transport that replays queued replies and records every request.
///
/// Once the queue is empty every call fails with a connection error, so a
/// test that issues an unexpected request fails loudly.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    /// Create a mock with no queued replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply
    pub fn with_reply(self, reply: Reply) -> Self {
        self.push(reply);
        self
    }

    /// Queue a successful response
    pub fn with_response(self, response: ApiResponse) -> Self {
        self.with_reply(Ok(response))
    }

    /// Queue a transport failure
    pub fn with_error(self, error: TransportError) -> Self {
        self.with_reply(Err(error))
    }

    /// Queue a reply on a shared mock
    pub fn push(&self, reply: Reply) {
        self.replies.lock().push_back(reply);
    }

    /// All requests performed so far, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Get the number of calls
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of requests with `method`
    pub fn method_call_count(&self, method: &Method) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == *method)
            .count()
    }

    /// Check if a request with `method` and `path` was performed
    pub fn was_called(&self, method: &Method, path: &str) -> bool {
        self.requests
            .lock()
            .iter()
            .any(|r| r.method == *method && r.path == path)
    }

    /// Number of replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }

    /// Clear recorded requests
    pub fn clear_calls(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let description = format!("{} {}", request.method, request.path);
        self.requests.lock().push(request);
        self.replies.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::Connection(format!(
                "no mock reply queued for {}",
                description
            )))
        })
    }
}

/// Body that counts how often it was closed.
#[derive(Debug)]
pub struct TrackedBody {
    bytes: Option<Bytes>,
    closes: Arc<AtomicUsize>,
    fail_read: bool,
    fail_close: bool,
}

/// Handle to a [`TrackedBody`]'s close counter.
#[derive(Debug, Clone, Default)]
pub struct CloseCounter(Arc<AtomicUsize>);

impl CloseCounter {
    /// Number of times the body was closed
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl TrackedBody {
    /// Create a body and a handle to its close counter
    pub fn new(bytes: impl Into<Bytes>) -> (Self, CloseCounter) {
        let counter = CloseCounter::default();
        let body = Self {
            bytes: Some(bytes.into()),
            closes: counter.0.clone(),
            fail_read: false,
            fail_close: false,
        };
        (body, counter)
    }

    /// Fail on read
    pub fn failing_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    /// Fail on close
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Wrap into a response
    pub fn into_response(self, status: u16, headers: HeaderMap) -> ApiResponse {
        ApiResponse::new(status_code(status), headers, Box::new(self))
    }
}

#[async_trait]
impl ResponseBody for TrackedBody {
    async fn read_all(&mut self) -> Result<Bytes, TransportError> {
        if self.fail_read {
            return Err(TransportError::Body("connection reset".to_string()));
        }
        Ok(self.bytes.take().unwrap_or_default())
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

pub(crate) fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
