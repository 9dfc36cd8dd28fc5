// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod adapters;
pub mod aggregate;
pub mod api;
pub mod config;
pub mod confidence;
pub mod convergence;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod fusion;
pub mod influence;
pub mod intelligence;
pub mod logging;
pub mod metrics;
pub mod narrative;
pub mod request;
pub mod sentiment;
pub mod source;
pub mod summary;

// ---- Re-exports for stable public API ----
pub use crate::adapters::{BoundAdapter, InvocationContext, SharedAdapter, SourceAdapter};
pub use crate::api::router;
pub use crate::engine::{analyze, IntelligenceEngine, Pipeline};
pub use crate::error::{AdapterError, ErrorKind, IntelligenceError};
pub use crate::fanout::{FanOutCoordinator, SourceOutcome, SourceResult};
pub use crate::intelligence::AggregatedIntelligence;
pub use crate::request::{AggregationRequest, RequestVariant};
pub use crate::source::{Source, SourceFamily, SourceRegistry};
pub use crate::summary::SourceSummary;
