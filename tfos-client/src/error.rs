//! Error types for security API operations.

use crate::envelope::StatusEnvelope;
use std::time::Duration;
use thiserror::Error;

/// Failure to complete an HTTP exchange with the cluster.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The exchange did not finish within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, DNS or TLS failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request could not be turned into a wire request.
    #[error("failed to build request: {0}")]
    Build(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl TransportError {
    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Malformed JSON in a response body.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The body is not valid JSON, or does not match the expected shape.
    #[error("malformed response body: {0}")]
    Body(#[source] serde_json::Error),

    /// The body is valid JSON but not an object at the top level.
    #[error("response body is not a JSON object")]
    NotAnObject,

    /// A single top-level field failed to decode.
    #[error("error decoding field {field:?}: {source}")]
    Field {
        /// Offending top-level key.
        field: String,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Discriminant of [`ClientError`], for branching without matching payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection, timeout or DNS failure.
    Transport,
    /// The cluster sent something that is not the JSON we expect.
    Decode,
    /// The HTTP status code was not one of the accepted codes.
    StatusMismatch,
    /// The cluster rejected the request with its own root causes.
    Api,
    /// The role is absent from a successfully decoded collection.
    NotFound,
    /// The request body could not be encoded.
    Encode,
}

/// Security API client error.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Response decode failure.
    #[error("{0}")]
    Decode(#[from] DecodeError),

    /// Error report returned by the cluster with an accepted status code.
    #[error("{0}")]
    Status(StatusEnvelope),

    /// The status code was not accepted. The envelope ends with the
    /// synthesized "Status Code Mismatch" cause.
    #[error("{0}")]
    StatusMismatch(StatusEnvelope),

    /// Role absent from the cluster.
    #[error("role {name:?} not found")]
    NotFound {
        /// Role name.
        name: String,
    },

    /// Request body serialization failure.
    #[error("error json-encoding request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ClientError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Status(_) => ErrorKind::Api,
            Self::StatusMismatch(_) => ErrorKind::StatusMismatch,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Encode(_) => ErrorKind::Encode,
        }
    }

    /// The status envelope, if this error carries one.
    pub fn envelope(&self) -> Option<&StatusEnvelope> {
        match self {
            Self::Status(envelope) | Self::StatusMismatch(envelope) => Some(envelope),
            _ => None,
        }
    }
}

impl From<StatusEnvelope> for ClientError {
    fn from(envelope: StatusEnvelope) -> Self {
        Self::Status(envelope)
    }
}

/// Result type alias for security API operations.
pub type Result<T> = std::result::Result<T, ClientError>;
