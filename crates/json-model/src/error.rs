use json_model_value::ValueError;
use thiserror::Error;

/// Hard failures of document operations.
///
/// Conversion failures and type mismatches are not errors: they surface as
/// `None` or as a no-op so typed access keeps working on partial payloads.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl ModelError {
    /// `true` when the rejected input was malformed text (as opposed to an
    /// I/O failure while reading it).
    pub fn is_parse_error(&self) -> bool {
        match self {
            ModelError::Value(e) => e.is_parse_error(),
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Value(ValueError::Io(e))
    }
}
