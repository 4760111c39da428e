//! Error types shared by the consolebot crates.
//!
//! Addressing never fails and lifecycle misuse is absorbed where it happens,
//! so only codec, API and adapter conditions have a type here.

use thiserror::Error;

// =============================================================================
// Codec Errors
// =============================================================================

/// Errors raised when converting between [`Message`](crate::Message) and the
/// console representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The console element has no segment counterpart.
    #[error("console element '{kind}' has no matching message segment")]
    UnmappedElement {
        /// Kind name reported by the console element.
        kind: String,
    },

    /// A serialized segment could not be decoded.
    #[error("invalid message segment: {0}")]
    InvalidSegment(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSegment(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The requested API is not part of the adapter's dispatch table.
    #[error("API '{api}' is not available in adapter '{adapter}'")]
    NotAvailable {
        /// Adapter name.
        adapter: &'static str,
        /// The requested API name.
        api: String,
    },

    /// The call parameters did not match the API.
    #[error("invalid parameters for '{api}': {reason}")]
    InvalidParams {
        /// The API name.
        api: String,
        /// Reason for failure.
        reason: String,
    },

    /// The bot or the front-end is not connected.
    #[error("bot is not connected")]
    NotConnected,

    /// A directory lookup found nothing.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// What was looked up (`user`, `channel`, `message`).
        kind: &'static str,
        /// The missing ID.
        id: String,
    },

    /// Message conversion failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The front-end rejected the call.
    #[error("frontend error: {0}")]
    Frontend(String),

    /// Failed to serialize/deserialize.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Creates a [`ApiError::NotAvailable`] for the console adapter.
    pub fn not_available(api: impl Into<String>) -> Self {
        Self::NotAvailable {
            adapter: crate::ADAPTER_NAME,
            api: api.into(),
        }
    }

    /// Creates an [`ApiError::InvalidParams`].
    pub fn invalid_params(api: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            api: api.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Adapter Errors
// =============================================================================

/// Errors that can occur in adapter lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// A bot with the same ID is already connected.
    #[error("bot with ID '{id}' is already connected")]
    BotAlreadyConnected {
        /// The duplicate bot ID.
        id: String,
    },

    /// `start` was called twice.
    #[error("adapter is already started")]
    AlreadyStarted,

    /// No Tokio runtime is available to run the front-end.
    #[error("adapter must be started from within a Tokio runtime")]
    NoRuntime,

    /// The operation requires a started adapter.
    #[error("adapter is not started")]
    NotStarted,

    /// The front-end failed.
    #[error("frontend error: {0}")]
    Frontend(String),

    /// The log sink could not be redirected.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors returned by [`LogSink`](crate::LogSink).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// Another owner currently holds the redirect.
    #[error("log sink is already redirected")]
    AlreadyRedirected,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for message conversion.
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_available_names_adapter_and_api() {
        let err = ApiError::not_available("nonexistent");
        assert_eq!(
            err.to_string(),
            "API 'nonexistent' is not available in adapter 'Console'"
        );
        assert!(matches!(err, ApiError::NotAvailable { api, .. } if api == "nonexistent"));
    }

    #[test]
    fn test_codec_error_converts_into_api_error() {
        let err: ApiError = CodecError::UnmappedElement {
            kind: "image".into(),
        }
        .into();
        assert!(matches!(err, ApiError::Codec(CodecError::UnmappedElement { .. })));
    }
}
