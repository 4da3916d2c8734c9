//! Security API client configuration.

use crate::retry::RetryConfig;
use std::time::Duration;

/// Deadline applied to every single security API call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Security API client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Cluster address(es). Only the first is used.
    pub urls: Vec<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Timeout applied by the HTTP transport itself.
    pub request_timeout: Option<Duration>,
    /// Deadline for one security API call, including retries.
    pub call_timeout: Duration,
    /// TLS configuration.
    pub tls: Option<TlsConfig>,
    /// Retry policy. `None` disables retries.
    pub retry: Option<RetryConfig>,
    /// Round-trip logging.
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Create a new configuration with a single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            password: None,
            request_timeout: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            tls: None,
            retry: None,
            logging: LoggingConfig::default(),
        }
    }

    /// Create configuration with multiple URLs for a cluster.
    pub fn cluster(urls: Vec<String>) -> Self {
        Self {
            urls,
            ..Self::new("")
        }
    }

    /// Set basic authentication credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set transport request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the per-call deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set TLS configuration.
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Enable retries.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set round-trip logging options.
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("urls", &self.urls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("call_timeout", &self.call_timeout)
            .field("tls", &self.tls)
            .field("retry", &self.retry)
            .field("logging", &self.logging)
            .finish()
    }
}

/// TLS configuration.
#[derive(Clone, Default)]
pub struct TlsConfig {
    /// PEM-encoded CA certificate used to verify the cluster.
    pub ca_cert_pem: Option<String>,
    /// Skip certificate verification (not recommended for production).
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    /// Create TLS config with a PEM CA certificate.
    pub fn with_ca_cert(ca_cert_pem: impl Into<String>) -> Self {
        Self {
            ca_cert_pem: Some(ca_cert_pem.into()),
            ..Default::default()
        }
    }

    /// Skip certificate verification (DANGER: only for development).
    pub fn insecure(mut self) -> Self {
        self.insecure_skip_verify = true;
        self
    }
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("ca_cert_pem", &self.ca_cert_pem.as_ref().map(|_| "<pem>"))
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}

/// Round-trip logging options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log each round trip at all.
    pub enabled: bool,
    /// Include request bodies in the log record.
    pub include_request_body: bool,
    /// Include response bodies in the log record.
    pub include_response_body: bool,
}

impl LoggingConfig {
    /// Logging enabled, bodies excluded.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Include request and response bodies.
    pub fn with_bodies(mut self, request: bool, response: bool) -> Self {
        self.include_request_body = request;
        self.include_response_body = response;
        self
    }
}
