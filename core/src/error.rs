//! Error types

use thiserror::Error;

/// Result type alias for token operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors raised while acquiring an installation token.
///
/// "Not found" and "no installations" are not errors: those surface as
/// `Ok(None)` from the operations that can produce them.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("invalid private key: {message}")]
    InvalidKey { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },

    /// Connectivity failure; the only class of error the retry loop retries.
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("upstream error: {message}")]
    UpstreamError { message: String },

    #[error("gave up after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },
}

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn upstream_error(message: impl Into<String>) -> Self {
        Self::UpstreamError {
            message: message.into(),
        }
    }

    pub fn retries_exhausted(attempts: u32, message: impl Into<String>) -> Self {
        Self::RetriesExhausted {
            attempts,
            message: message.into(),
        }
    }

    /// Whether the retry loop may try the operation again
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Get the error key for this error
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidKey { .. } => "invalid_key",
            Self::Internal { .. } => "internal_error",
            Self::Transport { .. } => "transport_error",
            Self::UpstreamError { .. } => "upstream_error",
            Self::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}
