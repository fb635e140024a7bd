//! Remote procedure collaborator.
//!
//! The backend exposes named procedures taking and returning JSON. This module
//! defines the seam ([`RemoteProcedures`]), its HTTP implementation, and the
//! normalization of the backend's loosely shaped responses.

pub mod envelope;
pub mod http;

use std::future::Future;

use serde_json::Value;

use crate::error::TransportError;

pub use envelope::{Envelope, MutationOutcome};
pub use http::HttpRemote;

/// Calls named remote procedures.
///
/// Implementations handle transport concerns only (timeouts, HTTP status);
/// interpreting the response body is left to [`envelope`].
pub trait RemoteProcedures: Send + Sync {
    /// Invokes `procedure` with a JSON payload and returns the raw response.
    fn call(
        &self,
        procedure: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}
