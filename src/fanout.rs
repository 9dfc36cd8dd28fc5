//! # Fan-out coordinator
//!
//! Invokes every bound adapter concurrently and collects exactly one
//! [`SourceResult`] per adapter, in registration order.
//!
//! - One tokio task per adapter, so a panic is contained to its own task.
//! - Each invocation is capped by the per-adapter timeout and dropped on
//!   caller cancellation; dropping the `run` future cancels them too.
//! - Errors are logged and folded into `SourceOutcome::Failed`; `run` itself
//!   never fails.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument, Span};

use crate::adapters::{BoundAdapter, InvocationContext, SharedAdapter};
use crate::error::ErrorKind;
use crate::logging::anon_hash;
use crate::request::AggregationRequest;
use crate::source::Source;
use crate::summary::SourceSummary;

pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Success,
    Failed,
}

/// Terminal state of one adapter invocation. Exactly one of payload / error.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Success(SourceSummary),
    Failed(ErrorKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceResult {
    pub source: Source,
    pub outcome: SourceOutcome,
    /// Wall time of the invocation. Diagnostic only; never part of the aggregate.
    pub elapsed_ms: u64,
}

impl SourceResult {
    pub fn success(source: Source, summary: SourceSummary) -> Self {
        Self {
            source,
            outcome: SourceOutcome::Success(summary),
            elapsed_ms: 0,
        }
    }

    pub fn failed(source: Source, kind: ErrorKind) -> Self {
        Self {
            source,
            outcome: SourceOutcome::Failed(kind),
            elapsed_ms: 0,
        }
    }

    fn elapsed(mut self, started: Instant) -> Self {
        self.elapsed_ms = started.elapsed().as_millis() as u64;
        self
    }

    pub fn status(&self) -> SourceStatus {
        match self.outcome {
            SourceOutcome::Success(_) => SourceStatus::Success,
            SourceOutcome::Failed(_) => SourceStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SourceOutcome::Success(_))
    }

    pub fn payload(&self) -> Option<&SourceSummary> {
        match &self.outcome {
            SourceOutcome::Success(s) => Some(s),
            SourceOutcome::Failed(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.outcome {
            SourceOutcome::Success(_) => None,
            SourceOutcome::Failed(k) => Some(k),
        }
    }
}

pub struct FanOutCoordinator {
    adapters: Vec<BoundAdapter>,
    timeout: Duration,
    span: Span,
}

impl FanOutCoordinator {
    pub fn new(adapters: Vec<BoundAdapter>, timeout: Duration) -> Self {
        Self {
            adapters,
            timeout,
            span: Span::none(),
        }
    }

    /// Parent span for every event this coordinator emits.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.adapters.iter().map(|b| &b.source)
    }

    /// Invoke all adapters and wait for every one of them to settle.
    pub async fn run(
        &self,
        request: &AggregationRequest,
        cancel: &CancellationToken,
    ) -> Vec<SourceResult> {
        self.run_inner(request, cancel)
            .instrument(self.span.clone())
            .await
    }

    async fn run_inner(
        &self,
        request: &AggregationRequest,
        cancel: &CancellationToken,
    ) -> Vec<SourceResult> {
        let started = Instant::now();
        let request = Arc::new(request.clone());
        let token = cancel.child_token();
        // Cancels in-flight adapters if this future is dropped before joining.
        let _guard = token.clone().drop_guard();

        info!(
            target: "fanout",
            location = %anon_hash(&request.location),
            adapters = self.adapters.len(),
            timeout_ms = self.timeout.as_millis() as u64,
            "fan-out start"
        );

        let handles = self.adapters.iter().map(|bound| {
            let span = info_span!("adapter", source = %bound.source.id, adapter = bound.adapter.name());
            tokio::spawn(
                invoke_one(
                    Arc::clone(&bound.adapter),
                    bound.source.clone(),
                    Arc::clone(&request),
                    token.clone(),
                    self.timeout,
                )
                .instrument(span),
            )
        });

        // join_all preserves input order, so slot i always belongs to adapter i.
        let joined = join_all(handles).await;

        let results: Vec<SourceResult> = joined
            .into_iter()
            .zip(self.adapters.iter())
            .map(|(joined, bound)| match joined {
                Ok(result) => result,
                Err(e) => {
                    let kind = if e.is_panic() {
                        ErrorKind::Panicked
                    } else {
                        ErrorKind::Cancelled
                    };
                    warn!(target: "fanout", source = %bound.source.id, kind = kind.as_str(), "adapter task aborted");
                    SourceResult::failed(bound.source.clone(), kind).elapsed(started)
                }
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        info!(
            target: "fanout",
            succeeded,
            failed = results.len() - succeeded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fan-out settled"
        );

        results
    }
}

async fn invoke_one(
    adapter: SharedAdapter,
    source: Source,
    request: Arc<AggregationRequest>,
    cancel: CancellationToken,
    timeout: Duration,
) -> SourceResult {
    let started = Instant::now();
    let ctx = InvocationContext {
        request: &request,
        cancel: &cancel,
    };

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ErrorKind::Cancelled),
        res = tokio::time::timeout(timeout, adapter.invoke(&ctx)) => match res {
            Err(_elapsed) => Err(ErrorKind::Timeout),
            Ok(Err(e)) => {
                warn!(target: "fanout", error = %e, "adapter error");
                Err(e.kind())
            }
            Ok(Ok(summary)) => check_payload(&source, summary),
        },
    };

    let result = match outcome {
        Ok(summary) => {
            debug!(target: "fanout", "adapter succeeded");
            SourceResult::success(source, summary)
        }
        Err(kind) => {
            warn!(target: "fanout", kind = kind.as_str(), "adapter failed");
            SourceResult::failed(source, kind)
        }
    };
    result.elapsed(started)
}

/// Reject payloads of the wrong family or with out-of-range values, so a
/// misbehaving adapter yields a clean failure instead of partial data.
fn check_payload(source: &Source, summary: SourceSummary) -> Result<SourceSummary, ErrorKind> {
    if summary.family() != source.family {
        warn!(
            target: "fanout",
            expected = source.family.as_str(),
            got = summary.family().as_str(),
            "payload family mismatch"
        );
        return Err(ErrorKind::InvalidResponse);
    }
    if let Err(problem) = summary.validate() {
        warn!(target: "fanout", %problem, "payload rejected");
        return Err(ErrorKind::InvalidResponse);
    }
    Ok(summary)
}
