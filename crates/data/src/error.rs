//! Data layer error types.

use serde_json::Value;
use thiserror::Error;

use puente_core::ledger::LedgerError;

/// Result type alias using `DataError`.
pub type DataResult<T> = Result<T, DataError>;

/// Failures of the remote-call collaborator itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint could not be reached or timed out.
    #[error("remote endpoint unreachable: {0}")]
    Unreachable(String),

    /// The endpoint answered with a non-success HTTP status.
    #[error("remote endpoint returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response body was not JSON.
    #[error("remote response is not valid JSON: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidBody(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

/// Errors returned by repositories, the gateway and the composer.
#[derive(Debug, Error)]
pub enum DataError {
    /// Missing session identity or required identifier; nothing was sent.
    #[error("{0}")]
    Precondition(String),

    /// The draft transaction broke a ledger rule; nothing was sent.
    #[error(transparent)]
    Validation(#[from] LedgerError),

    /// The backend answered but reported a failure.
    #[error("{message}")]
    Operation {
        /// Backend-supplied message.
        message: String,
        /// Raw response, for diagnostics.
        raw: Value,
    },

    /// The remote call failed below the envelope layer.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A record could not be mapped into its canonical shape.
    #[error("malformed record: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DataError {
    /// Builds an operation error from a backend message and the raw response.
    #[must_use]
    pub fn operation(message: impl Into<String>, raw: Value) -> Self {
        Self::Operation {
            message: message.into(),
            raw,
        }
    }

    /// Returns the error code for diagnostics and logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Precondition(_) => "PRECONDITION_FAILED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Operation { .. } => "OPERATION_FAILED",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Returns true if the message is meant to be shown to the user verbatim.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::Precondition(_) | Self::Validation(_) | Self::Operation { .. }
        )
    }

    /// Raw backend response, for operation errors.
    #[must_use]
    pub const fn raw_response(&self) -> Option<&Value> {
        match self {
            Self::Operation { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
