//! Error types for isovox

use thiserror::Error;

/// Main error type for isovox operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not open {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {reason} ({context})")]
    Parse { reason: String, context: String },

    #[error("Field '{0}' not found")]
    FieldNotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

impl Error {
    /// Build a structural parse error
    pub fn parse(reason: impl Into<String>, context: impl Into<String>) -> Self {
        Error::Parse {
            reason: reason.into(),
            context: context.into(),
        }
    }

    /// Whether the caller can recover by picking another field
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::FieldNotFound(_))
    }
}

/// Result type alias for isovox operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message_carries_context() {
        let err = Error::parse("POINT_DATA count 9 does not match 8 grid points", "line 5");
        let message = err.to_string();
        assert!(message.contains("9"));
        assert!(message.contains("line 5"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_field_not_found_is_recoverable() {
        assert!(Error::FieldNotFound("TEMP".to_string()).is_recoverable());
    }
}
