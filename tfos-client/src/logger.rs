//! Round-trip logging transport.

use crate::config::LoggingConfig;
use crate::error::TransportError;
use crate::request::ApiRequest;
use crate::response::{ApiResponse, BufferedBody};
use crate::transport::Transport;
use async_trait::async_trait;
use std::time::Instant;
use tfos_log::{FieldValue, Level};

const TARGET: &str = "opensearch";

/// Transport decorator that logs every round trip.
///
/// Failures are logged at error level, successes at trace level.
pub struct LoggingTransport<T> {
    inner: T,
    include_request_body: bool,
    include_response_body: bool,
}

impl<T: Transport> LoggingTransport<T> {
    /// Wrap `inner`, logging bodies as `config` says.
    pub fn new(inner: T, config: LoggingConfig) -> Self {
        Self {
            inner,
            include_request_body: config.include_request_body,
            include_response_body: config.include_response_body,
        }
    }

    /// Whether request bodies are logged.
    pub fn request_body_enabled(&self) -> bool {
        self.include_request_body
    }

    /// Whether response bodies are logged.
    pub fn response_body_enabled(&self) -> bool {
        self.include_response_body
    }
}

#[async_trait]
impl<T: Transport> Transport for LoggingTransport<T> {
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut fields: Vec<(&str, FieldValue)> = vec![
            ("method", request.method.as_str().into()),
            ("path", request.path.clone().into()),
        ];
        if self.include_request_body {
            if let Some(body) = &request.body {
                fields.push(("request_body", String::from_utf8_lossy(body).into_owned().into()));
                fields.push(("request_body_len", body.len().into()));
            }
        }

        let start = chrono::Utc::now();
        let timer = Instant::now();
        let result = self.inner.perform(request).await;
        let duration = timer.elapsed();

        fields.push(("start", start.to_rfc3339().into()));
        fields.push(("duration", format!("{:?}", duration).into()));

        match result {
            Ok(response) => {
                fields.push(("status", response.status.as_u16().into()));
                let response = if self.include_response_body {
                    let (status, headers, mut body) = response.into_parts();
                    let read = body.read_all().await;
                    if let Err(e) = body.close() {
                        tfos_log::debug!("Ignoring error closing response body: {}", e);
                    }
                    let bytes = match read {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            fields.push(("err", e.to_string().into()));
                            tfos_log::log_fields(
                                Level::Error,
                                TARGET,
                                &format!("OpenSearch client error: {}", e),
                                &fields,
                            );
                            return Err(e);
                        }
                    };
                    fields.push(("response_body", String::from_utf8_lossy(&bytes).into_owned().into()));
                    fields.push(("response_body_len", bytes.len().into()));
                    ApiResponse::new(status, headers, Box::new(BufferedBody::new(bytes)))
                } else {
                    response
                };

                tfos_log::log_fields(Level::Trace, TARGET, "OpenSearch client query tracer", &fields);
                Ok(response)
            }
            Err(e) => {
                fields.push(("err", e.to_string().into()));
                tfos_log::log_fields(
                    Level::Error,
                    TARGET,
                    &format!("OpenSearch client error: {}", e),
                    &fields,
                );
                Err(e)
            }
        }
    }
}
