// Error types for the provider layer

use thiserror::Error;

/// Violation of the typed attribute model.
///
/// These only arise when a schema declaration and the code reading it have
/// drifted apart, never from user input, so callers abort the operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttrError {
    #[error("attribute {attribute:?}: expected {expected}, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        found: String,
    },

    #[error("attribute {0:?} is missing")]
    MissingAttribute(String),

    #[error("attribute {0:?} is not part of the schema")]
    UnknownAttribute(String),

    #[error("attribute {0:?} is null or unknown where a value is required")]
    NullValue(String),

    #[error("value is not an object")]
    NotAnObject,
}

impl AttrError {
    pub(crate) fn mismatch(
        attribute: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        AttrError::TypeMismatch {
            attribute: attribute.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Provider configuration problems.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] serde_json::Error),
}

/// Result alias for typed attribute operations.
pub type Result<T> = std::result::Result<T, AttrError>;
