//! Response envelope decoding and root-cause aggregation.
//!
//! A security API response body is one of two shapes sharing the same
//! top level: a status report (`status`, `message`, `error`) or a map of
//! entity name to entity. [`decode_envelope`] inspects the raw keys and
//! commits to exactly one interpretation.

use crate::error::DecodeError;
use crate::model::Role;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Root-cause type synthesized when a response code is not accepted.
pub const STATUS_CODE_MISMATCH: &str = "Status Code Mismatch";

const KEY_ERROR: &str = "error";
const KEY_STATUS: &str = "status";
const KEY_MESSAGE: &str = "message";

// ============================================================================
// Root causes
// ============================================================================

/// One discrete error detail returned by the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCause {
    /// Error type, e.g. `illegal_argument_exception`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Human readable reason.
    #[serde(default)]
    pub reason: String,
}

impl RootCause {
    /// Create a root cause.
    pub fn new(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// Cause recorded when `actual` is not one of `accepted`.
    pub fn status_mismatch(actual: u16, accepted: &[u16]) -> Self {
        let accepted = accepted
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        Self::new(
            STATUS_CODE_MISMATCH,
            format!("Actual response code {actual} does not match expected [{accepted}]"),
        )
    }

    /// Whether both type and reason are empty.
    pub fn is_empty(&self) -> bool {
        self.kind.is_empty() && self.reason.is_empty()
    }
}

impl fmt::Display for RootCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "type={:?}; reason={:?}", self.kind, self.reason)
    }
}

impl std::error::Error for RootCause {}

/// An ordered, non-empty set of root causes reported as one error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCauses(Vec<RootCause>);

impl RootCauses {
    /// Aggregate causes in the order given. No causes means no error.
    pub fn aggregate(causes: impl IntoIterator<Item = RootCause>) -> Option<Self> {
        let causes: Vec<_> = causes.into_iter().collect();
        if causes.is_empty() {
            None
        } else {
            Some(Self(causes))
        }
    }

    /// The original causes, in order.
    pub fn causes(&self) -> &[RootCause] {
        &self.0
    }

    /// Consume into the original causes.
    pub fn into_inner(self) -> Vec<RootCause> {
        self.0
    }
}

impl fmt::Display for RootCauses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() == 1 {
            writeln!(f, "1 error occurred:")?;
        } else {
            writeln!(f, "{} errors occurred:", self.0.len())?;
        }
        for cause in &self.0 {
            writeln!(f, "\t* {}", cause)?;
        }
        writeln!(f)
    }
}

impl std::error::Error for RootCauses {}

// ============================================================================
// Status envelope
// ============================================================================

/// Normalized status/error report from the cluster.
///
/// Warnings come from the `Warning` response header, never from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawEnvelope")]
pub struct StatusEnvelope {
    /// `status` field, stringified when the cluster sends a number.
    pub status: String,
    /// `message` field.
    pub message: String,
    error: Option<Vec<RootCause>>,
    warnings: Vec<String>,
}

impl StatusEnvelope {
    /// Create an envelope with a status and message.
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Whether any recognized field carried a non-empty value.
    pub fn is_populated(&self) -> bool {
        self.has_errors() || !self.status.is_empty() || !self.message.is_empty()
    }

    /// Whether the envelope carries at least one root cause.
    pub fn has_errors(&self) -> bool {
        !self.root_causes().is_empty()
    }

    /// Root causes in the order the cluster returned them.
    pub fn root_causes(&self) -> &[RootCause] {
        self.error.as_deref().unwrap_or_default()
    }

    /// Aggregated error, if any causes are present.
    pub fn error(&self) -> Option<RootCauses> {
        RootCauses::aggregate(self.root_causes().iter().cloned())
    }

    /// Append a root cause after any existing ones.
    pub fn push_cause(&mut self, cause: RootCause) {
        self.error.get_or_insert_with(Vec::new).push(cause);
    }

    /// Header-sourced warnings.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Replace the header-sourced warnings.
    pub fn set_warnings(&mut self, warnings: Vec<String>) {
        self.warnings = warnings;
    }

    /// Builder form of [`set_warnings`](Self::set_warnings).
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Key/value rendering of every non-empty field, for logs.
    pub fn summary(&self) -> String {
        let mut bits = Vec::new();

        if !self.status.is_empty() {
            bits.push(format!("status={:?}", self.status));
        }
        if !self.message.is_empty() {
            bits.push(format!("message={:?}", self.message));
        }
        for (i, warning) in self.warnings.iter().enumerate() {
            bits.push(format!("warning_{}={:?}", i, warning));
        }
        for (i, cause) in self.root_causes().iter().enumerate() {
            bits.push(format!("error_{}_type={:?}", i, cause.kind));
            bits.push(format!("error_{}_reason={:?}", i, cause.reason));
        }

        bits.join("; ")
    }
}

impl fmt::Display for StatusEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error() {
            Some(err) => write!(f, "{}", err),
            None => Ok(()),
        }
    }
}

impl std::error::Error for StatusEnvelope {}

// The cluster is not consistent about these shapes across versions:
// `status` may be a number and `error` may be a bare string.
#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    status: Option<StatusField>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<ErrorField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusField {
    Text(String),
    Code(i64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Detailed {
        #[serde(default)]
        root_cause: Vec<RootCause>,
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    },
    Text(String),
}

impl ErrorField {
    // Blank values (`""`, `{}`, empty causes) carry no error.
    fn into_causes(self) -> Option<Vec<RootCause>> {
        let causes = match self {
            ErrorField::Detailed {
                root_cause,
                kind,
                reason,
            } => {
                let root_cause: Vec<_> = root_cause.into_iter().filter(|c| !c.is_empty()).collect();
                if !root_cause.is_empty() {
                    root_cause
                } else {
                    let own = RootCause::new(kind.unwrap_or_default(), reason.unwrap_or_default());
                    vec![own].into_iter().filter(|c| !c.is_empty()).collect()
                }
            }
            ErrorField::Text(reason) if reason.is_empty() => Vec::new(),
            ErrorField::Text(reason) => vec![RootCause::new("error", reason)],
        };
        (!causes.is_empty()).then_some(causes)
    }
}

impl From<RawEnvelope> for StatusEnvelope {
    fn from(raw: RawEnvelope) -> Self {
        let status = match raw.status {
            Some(StatusField::Text(s)) => s,
            Some(StatusField::Code(c)) => c.to_string(),
            None => String::new(),
        };
        Self {
            status,
            message: raw.message.unwrap_or_default(),
            error: raw.error.and_then(ErrorField::into_causes),
            warnings: Vec::new(),
        }
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A decoded response body: either a status report or named entries.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    /// The body carried a populated status/error report.
    Status(StatusEnvelope),
    /// The body was a map of entity name to entity.
    Entries(BTreeMap<String, T>),
}

/// Result of listing roles.
pub type RoleCollection = Envelope<Role>;

impl<T> Envelope<T> {
    /// The status report, if this is one.
    pub fn status(&self) -> Option<&StatusEnvelope> {
        match self {
            Self::Status(status) => Some(status),
            Self::Entries(_) => None,
        }
    }

    /// Look up an entry by name. Always `None` for a status report.
    pub fn get(&self, name: &str) -> Option<&T> {
        match self {
            Self::Status(_) => None,
            Self::Entries(entries) => entries.get(name),
        }
    }

    /// Remove and return an entry by name.
    pub fn take(&mut self, name: &str) -> Option<T> {
        match self {
            Self::Status(_) => None,
            Self::Entries(entries) => entries.remove(name),
        }
    }

    /// Number of entries. Zero for a status report.
    pub fn len(&self) -> usize {
        match self {
            Self::Status(_) => 0,
            Self::Entries(entries) => entries.len(),
        }
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode a response body into a status report or a map of entries.
///
/// When any of `error`, `status` or `message` is present and non-empty the
/// result is [`Envelope::Status`] and the remaining keys are not decoded.
/// Otherwise every key is decoded as a `T`.
///
/// # Errors
///
/// [`DecodeError::Body`] for malformed JSON, [`DecodeError::NotAnObject`]
/// when the top level is not an object, and [`DecodeError::Field`] naming
/// the key that failed to decode.
pub fn decode_envelope<T: DeserializeOwned>(bytes: &[u8]) -> Result<Envelope<T>, DecodeError> {
    let value: Value = serde_json::from_slice(bytes).map_err(DecodeError::Body)?;
    let Value::Object(mut fields) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let status = take_status(&mut fields)?;
    if status.is_populated() {
        return Ok(Envelope::Status(status));
    }

    fields
        .into_iter()
        .map(|(name, raw)| match serde_json::from_value(raw) {
            Ok(entry) => Ok((name, entry)),
            Err(source) => Err(DecodeError::Field {
                field: name,
                source,
            }),
        })
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map(Envelope::Entries)
}

/// Decode a body that is expected to be a status report.
///
/// An empty body decodes to an empty envelope.
pub fn decode_status(bytes: &[u8]) -> Result<StatusEnvelope, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(StatusEnvelope::default());
    }
    let value: Value = serde_json::from_slice(bytes).map_err(DecodeError::Body)?;
    let Value::Object(mut fields) = value else {
        return Err(DecodeError::NotAnObject);
    };
    take_status(&mut fields)
}

fn take_status(fields: &mut Map<String, Value>) -> Result<StatusEnvelope, DecodeError> {
    let mut recognized = Map::new();
    for key in [KEY_ERROR, KEY_STATUS, KEY_MESSAGE] {
        if let Some(v) = fields.remove(key) {
            // Decode each key on its own so a failure names the field.
            let mut single = Map::new();
            single.insert(key.to_string(), v.clone());
            serde_json::from_value::<RawEnvelope>(Value::Object(single)).map_err(|source| {
                DecodeError::Field {
                    field: key.to_string(),
                    source,
                }
            })?;
            recognized.insert(key.to_string(), v);
        }
    }

    serde_json::from_value(Value::Object(recognized)).map_err(DecodeError::Body)
}
