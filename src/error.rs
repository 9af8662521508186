use std::fmt;

use thiserror::Error;

/// Which input of a create request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    LongUrl,
    Shortcode,
    Validity,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::LongUrl => "longUrl",
            Field::Shortcode => "shortcode",
            Field::Validity => "validity",
        };
        f.write_str(name)
    }
}

/// Rejection of a create request. Always reported to the caller, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a URL")]
    EmptyUrl,

    #[error("'{0}' is not a valid URL (include a scheme such as https://)")]
    InvalidUrl(String),

    #[error("Shortcode '{0}' must contain only letters and numbers")]
    InvalidShortcode(String),

    #[error("Shortcode '{0}' is already taken")]
    ShortcodeTaken(String),

    #[error("Validity must be between 1 and 10080 minutes (1 week), got {0}")]
    ValidityOutOfRange(i64),
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::EmptyUrl | ValidationError::InvalidUrl(_) => Field::LongUrl,
            ValidationError::InvalidShortcode(_) | ValidationError::ShortcodeTaken(_) => {
                Field::Shortcode
            }
            ValidationError::ValidityOutOfRange(_) => Field::Validity,
        }
    }
}

/// Failure reading or writing a persistence slot.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored records are not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure talking to the evaluation service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service rejected the request with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("no access token available")]
    MissingToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_error_names_its_field() {
        assert_eq!(ValidationError::EmptyUrl.field(), Field::LongUrl);
        assert_eq!(ValidationError::InvalidUrl("x".into()).field(), Field::LongUrl);
        assert_eq!(
            ValidationError::InvalidShortcode("a-b".into()).field(),
            Field::Shortcode
        );
        assert_eq!(
            ValidationError::ShortcodeTaken("abc".into()).field(),
            Field::Shortcode
        );
        assert_eq!(ValidationError::ValidityOutOfRange(0).field(), Field::Validity);
    }

    #[test]
    fn validity_message_mentions_bounds() {
        let msg = ValidationError::ValidityOutOfRange(20000).to_string();
        assert!(msg.contains("1"));
        assert!(msg.contains("10080"));
        assert!(msg.contains("20000"));
    }
}
