//! Error types for the dnsync system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dnsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dnsync system
#[derive(Error, Debug)]
pub enum Error {
    /// Resource registry-related errors
    #[error("Registry error: {0}")]
    Registry(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection or server-side failures (worth retrying on the next pass)
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Record, domain or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider role already registered with the registry
    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Coarse classification used by the engine to branch on failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The addressed record/domain/resource does not exist
    NotFound,
    /// Network or remote-side failure
    Transport,
    /// Everything else
    Other,
}

impl Error {
    /// Create a registry error
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an "already registered" error
    pub fn already_registered(msg: impl Into<String>) -> Self {
        Self::AlreadyRegistered(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Transport(_) | Self::RateLimited(_) => ErrorKind::Transport,
            _ => ErrorKind::Other,
        }
    }

    /// Shorthand for `kind() == ErrorKind::NotFound`
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::not_found("www A").kind(), ErrorKind::NotFound);
        assert_eq!(Error::transport("reset").kind(), ErrorKind::Transport);
        assert_eq!(Error::rate_limited("429").kind(), ErrorKind::Transport);
        assert_eq!(Error::provider("gandi", "boom").kind(), ErrorKind::Other);
        assert_eq!(Error::already_registered("dns").kind(), ErrorKind::Other);
    }

    #[test]
    fn test_not_found_does_not_depend_on_message() {
        // A message mentioning "not found" does not make an error a NotFound
        let err = Error::provider("gandi", "Can't find the DNS record");
        assert!(!err.is_not_found());
        assert!(Error::not_found("anything").is_not_found());
    }

    #[test]
    fn test_provider_errors_name_the_provider() {
        let err = Error::provider("gandi", "Failed to create record www(A): 409");
        assert_eq!(
            err.to_string(),
            "Provider error (gandi): Failed to create record www(A): 409"
        );
    }
}
