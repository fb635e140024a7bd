//! Cache error types.
//!
//! These never leave the cache module: a corrupt document reads as empty and
//! is replaced on the next write.

use thiserror::Error;

/// Internal cache failures.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Stored document could not be parsed.
    #[error("cache document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Underlying store rejected a write.
    #[error("cache store error: {0}")]
    Store(String),
}
