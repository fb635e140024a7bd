//! Errors raised before any repository is built: session ingestion and
//! configuration loading.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// The session payload carries no usable session identifier.
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    /// Returns the error code for diagnostics and logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSession(_) => "INVALID_SESSION",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Returns true if the message is meant to be shown to the operator as-is.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        matches!(self, Self::InvalidSession(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::InvalidSession(String::new()).error_code(),
            "INVALID_SESSION"
        );
        assert_eq!(
            AppError::Configuration(String::new()).error_code(),
            "CONFIGURATION_ERROR"
        );
    }

    #[test]
    fn test_only_session_errors_are_user_visible() {
        assert!(AppError::InvalidSession("x".into()).is_user_visible());
        assert!(!AppError::Configuration("x".into()).is_user_visible());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::InvalidSession("missing session_id".into()).to_string(),
            "Invalid session: missing session_id"
        );
        assert_eq!(
            AppError::Configuration("msg".into()).to_string(),
            "Configuration error: msg"
        );
    }
}
