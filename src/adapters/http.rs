use std::time::Duration;

use async_trait::async_trait;

use crate::adapters::{InvocationContext, SourceAdapter};
use crate::error::AdapterError;
use crate::summary::SourceSummary;

/// Longest upstream error body kept in an `AdapterError::Upstream` message.
const ERROR_BODY_CAP: usize = 200;

/// Generic adapter for a service that accepts the aggregation request as JSON
/// and answers with a `SourceSummary` JSON document.
pub struct HttpJsonAdapter {
    name: String,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpJsonAdapter {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Client-side timeout, independent from the coordinator's own cap.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, AdapterError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Transport(format!("building http client: {e}")))?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SourceAdapter for HttpJsonAdapter {
    async fn invoke(&self, ctx: &InvocationContext<'_>) -> Result<SourceSummary, AdapterError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(ctx.request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(classify_reqwest_error)?;
        check_status(status, &body)?;

        serde_json::from_str(&body)
            .map_err(|e| AdapterError::InvalidResponse(format!("{}: {e}", self.name)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> AdapterError {
    if e.is_timeout() {
        AdapterError::Timeout(e.to_string())
    } else if e.is_decode() {
        AdapterError::InvalidResponse(e.to_string())
    } else {
        AdapterError::Transport(e.to_string())
    }
}

/// Map a non-2xx status to `Upstream`, keeping a bounded slice of the body.
pub(crate) fn check_status(status: u16, body: &str) -> Result<(), AdapterError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let message: String = body.trim().chars().take(ERROR_BODY_CAP).collect();
    Err(AdapterError::Upstream { status, message })
}
