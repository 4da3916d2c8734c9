//! Retry configuration and the retrying transport decorator.
//!
//! Every roles API call is idempotent (GET, PUT, DELETE), so a retried call
//! cannot apply twice.

use crate::error::TransportError;
use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::transport::Transport;
use async_trait::async_trait;
use std::time::Duration;
use tfos_log::{debug, warn};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
    /// Status codes that should trigger a retry.
    pub retry_status_codes: Vec<u16>,
    /// Whether to retry on connection errors.
    pub retry_on_connection_error: bool,
    /// Whether to retry on timeout errors.
    pub retry_on_timeout: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffStrategy::Exponential {
                initial: Duration::from_millis(100),
                max: Duration::from_secs(2),
                multiplier: 2.0,
            },
            retry_status_codes: vec![502, 503, 504],
            retry_on_connection_error: true,
            retry_on_timeout: false,
        }
    }
}

impl RetryConfig {
    /// Create a retry config with no delay.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::None,
            ..Default::default()
        }
    }

    /// Replace the status codes to retry on.
    pub fn with_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.retry_status_codes = codes;
        self
    }

    /// Retry on transport timeouts as well.
    pub fn with_retry_on_timeout(mut self, enabled: bool) -> Self {
        self.retry_on_timeout = enabled;
        self
    }

    /// Calculate delay for a given attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay_for_attempt(attempt)
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }

    /// Check if a transport error should trigger a retry.
    pub fn should_retry_error(&self, error: &TransportError) -> bool {
        match error {
            TransportError::Timeout(_) => self.retry_on_timeout,
            TransportError::Connection(_) => self.retry_on_connection_error,
            TransportError::Build(_) | TransportError::Body(_) => false,
        }
    }
}

/// Backoff strategy for retries.
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Exponential backoff: delay grows by `multiplier` each attempt.
    Exponential {
        /// Initial delay.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier (typically 2.0).
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
                let millis = (initial.as_millis() as f64 * factor).min(max.as_millis() as f64);
                Duration::from_millis(millis as u64).min(*max)
            }
        }
    }
}

/// Transport decorator that retries transient failures.
pub struct RetryTransport<T> {
    inner: T,
    config: RetryConfig,
}

impl<T: Transport> RetryTransport<T> {
    /// Wrap `inner` with `config`.
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// The retry policy.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryTransport<T> {
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut attempt = 0;
        loop {
            let result = self.inner.perform(request.clone()).await;
            let exhausted = attempt >= self.config.max_retries;

            match result {
                Ok(mut response)
                    if !exhausted && self.config.should_retry_status(response.status.as_u16()) =>
                {
                    debug!(
                        "{} {} returned {}, retrying (attempt {})",
                        request.method,
                        request.path,
                        response.status.as_u16(),
                        attempt + 1
                    );
                    if let Err(e) = response.body.close() {
                        debug!("Ignoring error closing discarded response body: {}", e);
                    }
                }
                Err(e) if !exhausted && self.config.should_retry_error(&e) => {
                    warn!(
                        "{} {} failed: {}, retrying (attempt {})",
                        request.method,
                        request.path,
                        e,
                        attempt + 1
                    );
                }
                other => return other,
            }

            tokio::time::sleep(self.config.delay_for_attempt(attempt)).await;
            attempt += 1;
        }
    }
}
