//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed response body
    #[error("Parse error: {0}")]
    Parse(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// No matching provider record
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Text that should have been an address but is not one
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Suffix bits reaching into the prefix, or wider than declared
    #[error("Suffix overlap: {0}")]
    SuffixOverlap(String),

    /// Prefix or suffix length out of range
    #[error("Invalid prefix length: {0}")]
    InvalidPrefixLength(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every attempt of a retried operation failed
    #[error("{operation}: gave up after {attempts} attempt(s): {last_error}")]
    RetryExhausted {
        /// What was being attempted
        operation: String,
        /// Number of attempts made
        attempts: usize,
        /// Error of the final attempt
        #[source]
        last_error: Box<Error>,
    },

    /// Local I/O errors (config file, log file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid address error
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create a suffix overlap error
    pub fn suffix_overlap(msg: impl Into<String>) -> Self {
        Self::SuffixOverlap(msg.into())
    }

    /// Create an invalid prefix length error
    pub fn invalid_prefix_length(msg: impl Into<String>) -> Self {
        Self::InvalidPrefixLength(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a retry exhaustion error
    pub fn retry_exhausted(operation: impl Into<String>, attempts: usize, last_error: Error) -> Self {
        Self::RetryExhausted {
            operation: operation.into(),
            attempts,
            last_error: Box::new(last_error),
        }
    }

    /// Whether this error came out of an exhausted retry loop
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }
}
