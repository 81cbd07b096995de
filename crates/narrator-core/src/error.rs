//! Unified error types for Narrator.

/// Main error type for Narrator operations.
#[derive(Debug, thiserror::Error)]
pub enum NarratorError {
    /// The synthesizer failed to produce audio.
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The target no longer exists (e.g., a session closed mid-request).
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource exhausted (e.g., too many live sessions).
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results with NarratorError.
pub type NarratorResult<T> = Result<T, NarratorError>;

impl NarratorError {
    /// Create a synthesis error with message.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Create an invalid input error with message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a config error with message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error with message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error was caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<toml::de::Error> for NarratorError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NarratorError::synthesis("model crashed");
        assert_eq!(err.to_string(), "synthesis failed: model crashed");

        let err = NarratorError::invalid_input("text is empty");
        assert_eq!(err.to_string(), "invalid input: text is empty");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            NarratorError::config("bad"),
            NarratorError::Config(_)
        ));
        assert!(matches!(
            NarratorError::internal("oops"),
            NarratorError::Internal(_)
        ));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(NarratorError::invalid_input("x").is_client_error());
        assert!(!NarratorError::synthesis("x").is_client_error());
        let io = NarratorError::from(std::io::Error::other("disk"));
        assert!(!io.is_client_error());
    }
}
