//! HTTP implementation of [`RemoteProcedures`].

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use puente_shared::config::RemoteConfig;

use super::RemoteProcedures;
use crate::error::TransportError;

const MAX_ERROR_BODY: usize = 512;

/// POSTs each procedure call as JSON to `{base_url}/{procedure}`.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    /// Creates a client with the configured base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Unreachable` if the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint URL of a procedure.
    #[must_use]
    pub fn endpoint(&self, procedure: &str) -> String {
        format!("{}/{}", self.base_url, procedure.trim_start_matches('/'))
    }
}

impl RemoteProcedures for HttpRemote {
    fn call(
        &self,
        procedure: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        let request = self.client.post(self.endpoint(procedure)).json(&payload);
        let procedure = procedure.to_string();

        async move {
            let response = request.send().await.map_err(|err| {
                warn!(procedure = %procedure, error = %err, "remote call failed");
                TransportError::from(err)
            })?;

            let status = response.status();
            if !status.is_success() {
                let mut body = response.text().await.unwrap_or_default();
                body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
                warn!(procedure = %procedure, status = status.as_u16(), "remote call rejected");
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let value = response.json::<Value>().await?;
            debug!(procedure = %procedure, "remote call completed");
            Ok(value)
        }
    }
}

fn floor_char_boundary(text: &str, max: usize) -> usize {
    if text.len() <= max {
        return text.len();
    }
    (0..=max)
        .rev()
        .find(|index| text.is_char_boundary(*index))
        .unwrap_or(0)
}
