//! Provider Logging
//!
//! Structured logging for the OpenSearch Terraform provider. Terraform
//! captures a plugin's stderr and understands hclog-style JSON lines, so
//! that is the default output format.
//!
//! # Usage
//!
//! ```rust
//! use tfos_log::{debug, info, warn, error, trace};
//!
//! debug!("Fetching role collection");
//! info!("Configured client for {} address(es)", 1);
//! warn!("Role {} not found, removing from state", "readers");
//! error!("Failed to reach cluster");
//!
//! let path = "/_plugins/_security/api/roles/";
//! trace!(target: "tfos::transport", "GET {}", path);
//! ```
//!
//! # Environment Variables
//!
//! - `TF_LOG_PROVIDER` - Provider log level, takes precedence over `TF_LOG`
//! - `TF_LOG=trace|debug|info|warn|error|off|json` - Terraform's global level
//! - `TF_LOG_FORMAT=json|pretty` - Output format (default `json`)

use once_cell::sync::Lazy;
use std::env;
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

// ============================================================================
// Log Levels
// ============================================================================

/// Log level, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    /// Trace level (round-trip tracing)
    Trace = 0,
    /// Debug level
    Debug = 1,
    /// Info level
    Info = 2,
    /// Warning level
    Warn = 3,
    /// Error level
    Error = 4,
    /// Off (no logging)
    Off = 5,
}

impl Level {
    /// Parse a Terraform log level.
    ///
    /// `json` is accepted because `TF_LOG=JSON` means "trace, as JSON".
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" | "json" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "" => Some(Level::Off),
            _ => None,
        }
    }

    /// Upper-case level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    /// Lower-case level name, as written to `@level`.
    pub fn hclog_name(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// hclog JSON lines
    Json,
    /// Human readable single line
    Pretty,
}

impl Format {
    /// Parse a format name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Format::Json),
            "pretty" | "text" => Some(Format::Pretty),
            _ => None,
        }
    }
}

// ============================================================================
// Structured Fields
// ============================================================================

/// Value attached to a structured log field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// String value
    Str(String),
    /// Integer value
    Int(i64),
    /// Boolean value
    Bool(bool),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{:?}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        FieldValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

// ============================================================================
// Global Configuration
// ============================================================================

/// Global log level, mirrored from [`LogConfig`] so macros stay cheap.
static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Off as u8);

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration.
#[derive(Debug)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Value written to `@module`, prefixed to each record's target
    pub module: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Off,
            format: Format::Json,
            module: "provider".to_string(),
        }
    }
}

impl LogConfig {
    /// Create config from the Terraform environment variables.
    pub fn from_env() -> Self {
        let level = env::var("TF_LOG_PROVIDER")
            .ok()
            .and_then(|s| Level::parse(&s))
            .or_else(|| env::var("TF_LOG").ok().and_then(|s| Level::parse(&s)))
            .unwrap_or(Level::Off);

        let format = env::var("TF_LOG_FORMAT")
            .ok()
            .and_then(|s| Format::parse(&s))
            .unwrap_or(Format::Json);

        LOG_LEVEL.store(level as u8, Ordering::SeqCst);

        Self {
            level,
            format,
            ..Self::default()
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Initialize the logging system from the environment.
///
/// Called lazily by the macros; call it explicitly for eager initialization.
pub fn init() {
    Lazy::force(&CONFIG);
}

/// Check if a log level is enabled.
#[inline]
pub fn is_level_enabled(level: Level) -> bool {
    init();
    level != Level::Off && level as u8 >= LOG_LEVEL.load(Ordering::Relaxed)
}

/// Get current log level.
pub fn current_level() -> Level {
    init();
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level at runtime.
pub fn set_level(level: Level) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Get the global configuration.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

// ============================================================================
// Log Output
// ============================================================================

/// Log a message with the given level.
#[doc(hidden)]
pub fn log(level: Level, target: &str, message: &str) {
    log_fields(level, target, message, &[]);
}

/// Log a message with structured key/value fields.
pub fn log_fields(level: Level, target: &str, message: &str, fields: &[(&str, FieldValue)]) {
    if !is_level_enabled(level) {
        return;
    }

    let config = config();
    let module = if target.is_empty() {
        config.module.clone()
    } else {
        format!("{}.{}", config.module, target)
    };

    match config.format {
        Format::Json => log_json(level, &module, message, fields),
        Format::Pretty => log_pretty(level, &module, message, fields),
    }
}

fn log_pretty(level: Level, module: &str, message: &str, fields: &[(&str, FieldValue)]) {
    let mut stderr = std::io::stderr().lock();

    let now = chrono::Local::now();
    let _ = write!(
        stderr,
        "{} [{}] {}: {}",
        now.format("%Y-%m-%dT%H:%M:%S%.3f%z"),
        level.as_str(),
        module,
        message
    );
    for (key, value) in fields {
        let _ = write!(stderr, " {}={}", key, value);
    }
    let _ = writeln!(stderr);
}

#[cfg(feature = "json")]
fn log_json(level: Level, module: &str, message: &str, fields: &[(&str, FieldValue)]) {
    if let Ok(json) = serde_json::to_string(&json_record(level, module, message, fields)) {
        eprintln!("{}", json);
    }
}

#[cfg(feature = "json")]
fn json_record(
    level: Level,
    module: &str,
    message: &str,
    fields: &[(&str, FieldValue)],
) -> serde_json::Map<String, serde_json::Value> {
    use serde_json::Value;

    let mut record = serde_json::Map::new();
    record.insert(
        "@timestamp".to_string(),
        Value::String(chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()),
    );
    record.insert("@level".to_string(), Value::String(level.hclog_name().to_string()));
    record.insert("@module".to_string(), Value::String(module.to_string()));
    record.insert("@message".to_string(), Value::String(message.to_string()));

    for (key, value) in fields {
        let value = match value {
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Bool(b) => Value::Bool(*b),
        };
        record.insert((*key).to_string(), value);
    }

    record
}

#[cfg(not(feature = "json"))]
fn log_json(level: Level, module: &str, message: &str, fields: &[(&str, FieldValue)]) {
    let mut line = format!(
        r#"{{"@timestamp":"{}","@level":"{}","@module":"{}","@message":"{}""#,
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f%:z"),
        level.hclog_name(),
        escape_json(module),
        escape_json(message)
    );
    for (key, value) in fields {
        match value {
            FieldValue::Str(s) => line.push_str(&format!(r#","{}":"{}""#, escape_json(key), escape_json(s))),
            FieldValue::Int(i) => line.push_str(&format!(r#","{}":{}"#, escape_json(key), i)),
            FieldValue::Bool(b) => line.push_str(&format!(r#","{}":{}"#, escape_json(key), b)),
        }
    }
    line.push('}');
    eprintln!("{}", line);
}

#[cfg(not(feature = "json"))]
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

// ============================================================================
// Macros
// ============================================================================

/// Log a trace message.
#[macro_export]
macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Trace) {
            $crate::log($crate::Level::Trace, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Trace) {
            $crate::log($crate::Level::Trace, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log a debug message.
///
/// # Example
///
/// ```rust
/// use tfos_log::debug;
///
/// let role = "readers";
/// debug!("Looking up role {}", role);
/// debug!(target: "tfos::resource", "Upserting role {}", role);
/// ```
#[macro_export]
macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Debug) {
            $crate::log($crate::Level::Debug, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Debug) {
            $crate::log($crate::Level::Debug, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log an info message.
#[macro_export]
macro_rules! info {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Info) {
            $crate::log($crate::Level::Info, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Info) {
            $crate::log($crate::Level::Info, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log a warning message.
#[macro_export]
macro_rules! warn {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Warn) {
            $crate::log($crate::Level::Warn, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Warn) {
            $crate::log($crate::Level::Warn, module_path!(), &format!($($arg)+));
        }
    };
}

/// Log an error message.
#[macro_export]
macro_rules! error {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Error) {
            $crate::log($crate::Level::Error, $target, &format!($($arg)+));
        }
    };
    ($($arg:tt)+) => {
        if $crate::is_level_enabled($crate::Level::Error) {
            $crate::log($crate::Level::Error, module_path!(), &format!($($arg)+));
        }
    };
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Off);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("TRACE"), Some(Level::Trace));
        assert_eq!(Level::parse("JSON"), Some(Level::Trace));
        assert_eq!(Level::parse("debug"), Some(Level::Debug));
        assert_eq!(Level::parse("warning"), Some(Level::Warn));
        assert_eq!(Level::parse(""), Some(Level::Off));
        assert_eq!(Level::parse("verbose"), None);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(Format::parse("json"), Some(Format::Json));
        assert_eq!(Format::parse("Pretty"), Some(Format::Pretty));
        assert_eq!(Format::parse("xml"), None);
    }

    #[test]
    fn test_off_is_never_enabled() {
        let original = current_level();

        set_level(Level::Trace);
        assert!(is_level_enabled(Level::Trace));
        assert!(is_level_enabled(Level::Error));
        assert!(!is_level_enabled(Level::Off));

        set_level(Level::Error);
        assert!(!is_level_enabled(Level::Warn));
        assert!(is_level_enabled(Level::Error));

        set_level(original);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_record_uses_hclog_keys() {
        let record = json_record(
            Level::Trace,
            "provider.transport",
            "OpenSearch client query tracer",
            &[("url", "http://localhost:9200/".into()), ("status", 200u16.into())],
        );

        assert_eq!(record["@level"], "trace");
        assert_eq!(record["@module"], "provider.transport");
        assert_eq!(record["@message"], "OpenSearch client query tracer");
        assert_eq!(record["url"], "http://localhost:9200/");
        assert_eq!(record["status"], 200);
        assert!(record.contains_key("@timestamp"));
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::from("a b").to_string(), "\"a b\"");
        assert_eq!(FieldValue::from(42usize).to_string(), "42");
        assert_eq!(FieldValue::from(true).to_string(), "true");
    }

    #[test]
    fn test_macros_compile() {
        trace!("trace message");
        debug!("debug message");
        info!("info message");
        warn!("warn message");
        error!("error message");

        trace!(target: "test", "with target");
        debug!(target: "test", "with target");

        let x = 42;
        debug!("formatted: {}", x);
    }
}
