//! Error types for the intelligence pipeline.
//!
//! Adapter failures never escape the fan-out boundary: they are folded into
//! an [`ErrorKind`] on a failed `SourceResult`. Only request validation and
//! caller cancellation surface to the caller as [`IntelligenceError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal failure classification recorded on a failed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    TransportError,
    UpstreamError,
    InvalidResponse,
    Cancelled,
    Panicked,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Panicked => "panicked",
        }
    }
}

/// Errors an adapter may return from `invoke`.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("adapter timed out: {0}")]
    Timeout(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Transport(_) => ErrorKind::TransportError,
            AdapterError::Upstream { .. } => ErrorKind::UpstreamError,
            AdapterError::Timeout(_) => ErrorKind::Timeout,
            AdapterError::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }
}

/// Top-level request validation failures. Raised before any adapter runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("location must not be empty")]
    EmptyLocation,

    #[error("spice tolerance range {min}..={max} is invalid (expected min <= max <= 10)")]
    InvalidSpiceRange { min: u8, max: u8 },
}

/// Errors surfaced by `IntelligenceEngine::aggregate`.
#[derive(Debug, Error)]
pub enum IntelligenceError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("request cancelled by caller")]
    Cancelled,
}

/// Source registry / configuration problems, detected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("no sources registered")]
    Empty,

    #[error("duplicate source id '{0}'")]
    DuplicateId(String),

    #[error("source '{id}' has fusion weight {weight} outside [0, 1]")]
    WeightOutOfRange { id: String, weight: f32 },

    #[error("fusion weights sum to {0:.3}, expected <= 1.0")]
    WeightSumExceeded(f32),

    #[error("source '{id}' has negative influence scaling")]
    NegativeScaling { id: String },

    #[error("no adapter bound to source '{0}'")]
    MissingAdapter(String),
}
