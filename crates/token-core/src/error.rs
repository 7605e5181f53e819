//! Error types for token lifecycle operations

use std::fmt;

/// A single field-scoped validation message, suitable for form display.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors from token lifecycle and resolution operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more fields failed validation. No store mutation happened.
    #[error("validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("token not found: {0}")]
    TokenNotFound(String),

    #[error("Project '{0}' does not exist")]
    UnknownProject(String),

    #[error("Package '{0}/{1}' does not exist")]
    UnknownPackage(String, String),

    #[error("not authorized")]
    Unauthorized,

    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Shorthand for a single-field validation failure.
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation(vec![FieldError::new(field, message)])
    }
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;
