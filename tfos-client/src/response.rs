//! Executed responses and their scoped bodies.

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderMap, WARNING};
use http::StatusCode;
use std::fmt;
use std::io;

/// A response body that must be closed once.
#[async_trait]
pub trait ResponseBody: Send {
    /// Read the remaining body.
    async fn read_all(&mut self) -> Result<Bytes, TransportError>;

    /// Release the body.
    fn close(&mut self) -> io::Result<()>;
}

/// A body already held in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferedBody {
    bytes: Option<Bytes>,
}

impl BufferedBody {
    /// Wrap bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }
}

#[async_trait]
impl ResponseBody for BufferedBody {
    async fn read_all(&mut self) -> Result<Bytes, TransportError> {
        Ok(self.bytes.take().unwrap_or_default())
    }

    fn close(&mut self) -> io::Result<()> {
        self.bytes = None;
        Ok(())
    }
}

/// A response as handed back by a [`Transport`](crate::transport::Transport).
pub struct ApiResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Unread body.
    pub body: Box<dyn ResponseBody>,
}

impl ApiResponse {
    /// Create a response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Box<dyn ResponseBody>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a response with an in-memory body.
    pub fn buffered(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self::new(status, headers, Box::new(BufferedBody::new(body)))
    }

    /// Warnings from `Warning` headers, in header order.
    pub fn warnings(&self) -> Vec<String> {
        self.headers
            .get_all(WARNING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// Whether any `Warning` header is present.
    pub fn has_warnings(&self) -> bool {
        self.headers.contains_key(WARNING)
    }

    /// Split into status, headers and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Box<dyn ResponseBody>) {
        (self.status, self.headers, self.body)
    }
}

impl fmt::Debug for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
