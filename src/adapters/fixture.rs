use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::adapters::{InvocationContext, SourceAdapter};
use crate::error::{AdapterError, ErrorKind};
use crate::summary::SourceSummary;

/// Adapter that serves a canned payload. Used by tests, the demo binary and
/// `fixture = "..."` entries in the config.
pub struct FixtureAdapter {
    name: String,
    mode: Mode,
    delay: Option<Duration>,
}

enum Mode {
    Summary(SourceSummary),
    // Parsed on every invocation so malformed fixtures surface as
    // `InvalidResponse` exactly like a malformed upstream body would.
    Json(String),
    Fail(ErrorKind),
}

impl FixtureAdapter {
    pub fn from_summary(name: impl Into<String>, summary: SourceSummary) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Summary(summary),
            delay: None,
        }
    }

    pub fn from_json_str(name: impl Into<String>, json: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Json(json.to_string()),
            delay: None,
        }
    }

    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture from {}", path.display()))?;
        Ok(Self::from_json_str(name, &json))
    }

    /// Always fails with the given kind.
    pub fn failing(name: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Fail(kind),
            delay: None,
        }
    }

    /// Simulated latency before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl SourceAdapter for FixtureAdapter {
    async fn invoke(&self, _ctx: &InvocationContext<'_>) -> Result<SourceSummary, AdapterError> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        match &self.mode {
            Mode::Summary(s) => Ok(s.clone()),
            Mode::Json(raw) => serde_json::from_str(raw)
                .map_err(|e| AdapterError::InvalidResponse(format!("fixture {}: {e}", self.name))),
            Mode::Fail(kind) => Err(error_for(*kind, &self.name)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn error_for(kind: ErrorKind, name: &str) -> AdapterError {
    let msg = format!("fixture {name} configured to fail");
    match kind {
        ErrorKind::Timeout => AdapterError::Timeout(msg),
        ErrorKind::UpstreamError => AdapterError::Upstream {
            status: 503,
            message: msg,
        },
        ErrorKind::InvalidResponse => AdapterError::InvalidResponse(msg),
        ErrorKind::TransportError | ErrorKind::Cancelled | ErrorKind::Panicked => {
            AdapterError::Transport(msg)
        }
    }
}
