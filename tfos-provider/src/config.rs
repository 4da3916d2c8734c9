// Provider block configuration

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use tfos_client::{ClientConfig, LoggingConfig, RetryConfig, TlsConfig};
use tfos_log::debug;
use url::Url;

type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variables consulted for settings the block leaves unset.
pub mod env {
    pub const ADDRESSES: &str = "OPENSEARCH_ADDRESSES";
    pub const USERNAME: &str = "OPENSEARCH_USERNAME";
    pub const PASSWORD: &str = "OPENSEARCH_PASSWORD";
    pub const CA_CERT: &str = "OPENSEARCH_CA_CERT";
    pub const INSECURE_SKIP_TLS_VERIFY: &str = "OPENSEARCH_INSECURE_SKIP_TLS_VERIFY";
}

/// Retries a request at most this many times unless `max_retries` says
/// otherwise.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// The provider block, as rendered to JSON by the host.
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub addresses: Option<Vec<String>>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ca_cert: Option<String>,
    pub retry_on_status: Option<Vec<i64>>,
    pub disable_retry: Option<bool>,
    pub enable_retry_on_timeout: Option<bool>,
    pub max_retries: Option<i64>,
    pub compress_request_body: Option<bool>,
    pub insecure_skip_tls_verify: Option<bool>,
    pub use_response_check_only: Option<bool>,
    pub skip_init_product_check: Option<bool>,
    pub logging: Option<LoggingBlock>,
}

/// The nested `logging` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingBlock {
    pub enabled: Option<bool>,
    pub include_request_body: Option<bool>,
    pub include_response_body: Option<bool>,
}

impl ProviderConfig {
    /// Parse the JSON rendering of the block. `null` is an empty block.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Fill unset settings from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Fill unset settings from `lookup`.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if self.addresses.is_none() {
            if let Some(raw) = lookup(env::ADDRESSES) {
                let addresses: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                if !addresses.is_empty() {
                    self.addresses = Some(addresses);
                }
            }
        }
        if self.username.is_none() {
            self.username = lookup(env::USERNAME);
        }
        if self.password.is_none() {
            self.password = lookup(env::PASSWORD);
        }
        if self.ca_cert.is_none() {
            self.ca_cert = lookup(env::CA_CERT);
        }
        if self.insecure_skip_tls_verify.is_none() {
            if let Some(raw) = lookup(env::INSECURE_SKIP_TLS_VERIFY) {
                self.insecure_skip_tls_verify = Some(parse_bool(env::INSECURE_SKIP_TLS_VERIFY, &raw)?);
            }
        }
        Ok(self)
    }

    pub fn addresses(&self) -> &[String] {
        self.addresses.as_deref().unwrap_or_default()
    }

    pub fn skip_init_product_check(&self) -> bool {
        self.skip_init_product_check.unwrap_or(false)
    }

    /// Retry policy; `None` when retries are disabled.
    pub fn retry(&self) -> Option<RetryConfig> {
        if self.disable_retry.unwrap_or(false) {
            return None;
        }
        let max_retries = self
            .max_retries
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let mut retry = RetryConfig::immediate(max_retries)
            .with_retry_on_timeout(self.enable_retry_on_timeout.unwrap_or(false));
        if let Some(statuses) = &self.retry_on_status {
            retry = retry.with_status_codes(
                statuses
                    .iter()
                    .filter_map(|s| u16::try_from(*s).ok())
                    .collect(),
            );
        }
        Some(retry)
    }

    pub fn logging(&self) -> LoggingConfig {
        match &self.logging {
            Some(block) if block.enabled.unwrap_or(false) => LoggingConfig::enabled().with_bodies(
                block.include_request_body.unwrap_or(false),
                block.include_response_body.unwrap_or(false),
            ),
            _ => LoggingConfig::default(),
        }
    }

    /// Client configuration for these settings. Call [`Validate::validate`]
    /// first.
    pub fn to_client_config(&self) -> ClientConfig {
        if self.compress_request_body.unwrap_or(false) {
            debug!("compress_request_body is accepted but has no effect");
        }
        if self.use_response_check_only.unwrap_or(false) {
            debug!("use_response_check_only is accepted but has no effect");
        }

        let mut config = ClientConfig::cluster(self.addresses().to_vec()).with_logging(self.logging());

        if let Some(username) = &self.username {
            config = config.with_basic_auth(username.clone(), self.password.clone().unwrap_or_default());
        }

        let insecure = self.insecure_skip_tls_verify.unwrap_or(false);
        let tls = match &self.ca_cert {
            Some(pem) => Some(TlsConfig::with_ca_cert(pem.clone())),
            None if insecure => Some(TlsConfig::default()),
            None => None,
        };
        if let Some(tls) = tls {
            config = config.with_tls(if insecure { tls.insecure() } else { tls });
        }

        if let Some(retry) = self.retry() {
            config = config.with_retry(retry);
        }
        config
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("addresses", &self.addresses)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ca_cert", &self.ca_cert.as_ref().map(|_| "<pem>"))
            .field("retry_on_status", &self.retry_on_status)
            .field("disable_retry", &self.disable_retry)
            .field("enable_retry_on_timeout", &self.enable_retry_on_timeout)
            .field("max_retries", &self.max_retries)
            .field("compress_request_body", &self.compress_request_body)
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .field("use_response_check_only", &self.use_response_check_only)
            .field("skip_init_product_check", &self.skip_init_product_check)
            .field("logging", &self.logging)
            .finish()
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::EnvError(format!(
            "{} must be a boolean, got {:?}",
            key, raw
        ))),
    }
}

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<()> {
        if self.addresses().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "at least one address is required, set {} or {}",
                crate::schema::attr::ADDRESSES,
                env::ADDRESSES
            )));
        }
        for address in self.addresses() {
            ConfigValidator::is_url(address, crate::schema::attr::ADDRESSES)?;
        }
        if let Some(max) = self.max_retries {
            ConfigValidator::in_range(max, 0, i64::from(u32::MAX), crate::schema::attr::MAX_RETRIES)?;
        }
        for status in self.retry_on_status.iter().flatten() {
            ConfigValidator::is_status_code(*status, crate::schema::attr::RETRY_ON_STATUS)?;
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ConfigError::ValidationError(format!(
                "{} requires {}",
                crate::schema::attr::PASSWORD,
                crate::schema::attr::USERNAME
            )));
        }
        Ok(())
    }
}

/// Configuration validator with rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is an absolute http(s) URL
    pub fn is_url(value: &str, field: &str) -> Result<()> {
        let parsed = Url::parse(value).map_err(|e| {
            ConfigError::ValidationError(format!("{} must be a valid URL, got {:?}: {}", field, value, e))
        })?;
        match parsed.scheme() {
            "http" | "https" if parsed.has_host() => Ok(()),
            _ => Err(ConfigError::ValidationError(format!(
                "{} must be an http or https URL, got {:?}",
                field, value
            ))),
        }
    }

    /// Validate that a number is within range
    pub fn in_range<T: PartialOrd + fmt::Display>(value: T, min: T, max: T, field: &str) -> Result<()> {
        if value < min || value > max {
            return Err(ConfigError::ValidationError(format!(
                "{} must be between {} and {}, got {}",
                field, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate an HTTP status code
    pub fn is_status_code(value: i64, field: &str) -> Result<()> {
        Self::in_range(value, 100, 599, field)
    }
}
