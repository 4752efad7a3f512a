use thiserror::Error;

use crate::encoding::TextEncoding;

/// Errors raised while reading or writing the text form of a [`ValueStore`].
///
/// Every variant is a hard failure: the operation that produced it did not
/// modify any store.
///
/// [`ValueStore`]: crate::ValueStore
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("expected a JSON object at the top level, found {found}")]
    NotAnObject { found: &'static str },
    #[error("text is not valid {encoding}: {reason}")]
    Encoding {
        encoding: TextEncoding,
        reason: String,
    },
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl ValueError {
    /// Returns `true` when the payload itself was rejected (syntax, shape or
    /// encoding), as opposed to an I/O failure while obtaining it.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ValueError::Parse(_) | ValueError::NotAnObject { .. } | ValueError::Encoding { .. }
        )
    }

    pub(crate) fn encoding(encoding: TextEncoding, reason: impl Into<String>) -> Self {
        ValueError::Encoding {
            encoding,
            reason: reason.into(),
        }
    }
}
