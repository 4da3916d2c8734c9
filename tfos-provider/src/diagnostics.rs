//! Diagnostics sink and the adapters that fill it from client errors.

use crate::error::AttrError;
use std::fmt;
use tfos_client::{ClientError, StatusEnvelope};
use tfos_log::{error, warn};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "Warning"),
            Severity::Error => write!(f, "Error"),
        }
    }
}

/// One user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.summary, self.detail)
    }
}

/// Ordered accumulator of diagnostics for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => error!("{}: {}", diagnostic.summary, diagnostic.detail),
            Severity::Warning => warn!("{}: {}", diagnostic.summary, diagnostic.detail),
        }
        self.items.push(diagnostic);
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::error(summary, detail));
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::warning(summary, detail));
    }

    /// Move every diagnostic of `other` onto the end of this sink.
    pub fn append(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_error(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| !d.is_error())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Types that can report themselves into a diagnostics sink.
pub trait AppendDiagnostics {
    fn append_diagnostics(&self, diags: &mut Diagnostics);
}

impl AppendDiagnostics for StatusEnvelope {
    /// Warnings first, one per header, then one error per root cause.
    fn append_diagnostics(&self, diags: &mut Diagnostics) {
        for warning in self.warnings() {
            diags.add_warning(warning.as_str(), warning.as_str());
        }
        for cause in self.root_causes() {
            diags.add_error(cause.kind.as_str(), cause.reason.as_str());
        }
    }
}

impl AppendDiagnostics for AttrError {
    fn append_diagnostics(&self, diags: &mut Diagnostics) {
        diags.add_error("Provider schema mismatch", self.to_string());
    }
}

/// Report a client error.
///
/// Envelope-carrying errors expand into their warnings and root causes.
/// Decode failures get their own summary so a garbled reply is never
/// confused with a refusal. Everything else becomes one error with
/// `summary` and `"{context}: {err}"` as detail.
pub fn append_client_error(
    diags: &mut Diagnostics,
    summary: &str,
    context: &str,
    err: &ClientError,
) {
    match err {
        ClientError::Status(envelope) | ClientError::StatusMismatch(envelope) => {
            envelope.append_diagnostics(diags)
        }
        ClientError::Decode(e) => diags.add_error(
            "Error decoding OpenSearch response",
            format!("{}: {}", context, e),
        ),
        other => diags.add_error(summary, format!("{}: {}", context, other)),
    }
}
