//! # Intelligence Engine
//! Wires request validation, fan-out and the pure analysis pipeline.
//!
//! [`Pipeline::analyze`] is free of I/O and clocks: the same result set
//! always yields the same [`AggregatedIntelligence`], which keeps it suitable
//! for unit tests and offline replay.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument, Span};

use crate::aggregate::ResultAggregator;
use crate::confidence::{confidence_score, ConfidenceFactors};
use crate::convergence::{self, ConvergenceAnalyzer};
use crate::error::IntelligenceError;
use crate::fanout::{FanOutCoordinator, SourceResult};
use crate::fusion;
use crate::influence;
use crate::intelligence::{AggregatedIntelligence, SourceReport};
use crate::logging::anon_hash;
use crate::narrative::{NarrativeInputs, RecommendationContextBuilder};
use crate::request::AggregationRequest;

/// The post-fan-out stages, in order: aggregate, converge, fuse, rank,
/// score, narrate.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    aggregator: ResultAggregator,
    convergence: ConvergenceAnalyzer,
    confidence_floor: u8,
}

impl Pipeline {
    pub fn new(convergence: ConvergenceAnalyzer, confidence_floor: u8) -> Self {
        Self {
            aggregator: ResultAggregator::new(),
            convergence,
            confidence_floor: confidence_floor.min(100),
        }
    }

    pub fn convergence(&self) -> &ConvergenceAnalyzer {
        &self.convergence
    }

    pub fn confidence_floor(&self) -> u8 {
        self.confidence_floor
    }

    pub fn analyze(&self, results: &[SourceResult]) -> AggregatedIntelligence {
        let signals = self.aggregator.aggregate(results);
        if signals.succeeded == 0 {
            return AggregatedIntelligence::fallback(results, self.confidence_floor);
        }

        let convergent = self.convergence.analyze(&signals.observations);
        let unified = fusion::fuse(&signals.samples);
        let ranking = influence::rank(&signals.volumes);

        let factors = ConfidenceFactors::derive(
            unified,
            &convergent,
            self.convergence.limit(),
            signals.succeeded,
            &ranking,
        );
        let score = confidence_score(signals.succeeded, signals.total, &factors);

        let narrative = RecommendationContextBuilder::new().build(&NarrativeInputs {
            unified_sentiment: unified,
            convergent: &convergent,
            ranking: &ranking,
            succeeded: signals.succeeded,
            total: signals.total,
            confidence_score: score,
        });

        AggregatedIntelligence {
            unified_sentiment: unified,
            viral_convergence: convergent.iter().map(|t| t.term.clone()).collect(),
            trend_lifecycle: convergence::lifecycle(&convergent),
            platform_influence_ranking: ranking.iter().map(|e| e.source.clone()).collect(),
            confidence_score: score,
            narrative,
            convergent_trends: convergent,
            influence_scores: ranking,
            sources: results.iter().map(SourceReport::from).collect(),
        }
    }
}

/// Analyze a settled result set with default thresholds.
pub fn analyze(results: &[SourceResult]) -> AggregatedIntelligence {
    Pipeline::default().analyze(results)
}

/// One request's outcome together with the raw per-source results
/// (kept for metrics and diagnostics; never part of the aggregate).
#[derive(Debug, Clone)]
pub struct EngineRun {
    pub intelligence: AggregatedIntelligence,
    pub results: Vec<SourceResult>,
}

pub struct IntelligenceEngine {
    coordinator: FanOutCoordinator,
    pipeline: Pipeline,
    span: Span,
}

impl IntelligenceEngine {
    pub fn new(coordinator: FanOutCoordinator, pipeline: Pipeline) -> Self {
        Self {
            coordinator,
            pipeline,
            span: Span::none(),
        }
    }

    /// Parent span for engine events. Pass the same span to the coordinator
    /// to keep fan-out events under it.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn coordinator(&self) -> &FanOutCoordinator {
        &self.coordinator
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub async fn aggregate(
        &self,
        request: AggregationRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregatedIntelligence, IntelligenceError> {
        self.run(request, cancel).await.map(|r| r.intelligence)
    }

    /// Like [`aggregate`](Self::aggregate) but also hands back the raw results.
    pub async fn run(
        &self,
        request: AggregationRequest,
        cancel: &CancellationToken,
    ) -> Result<EngineRun, IntelligenceError> {
        self.run_inner(request, cancel)
            .instrument(self.span.clone())
            .await
    }

    async fn run_inner(
        &self,
        request: AggregationRequest,
        cancel: &CancellationToken,
    ) -> Result<EngineRun, IntelligenceError> {
        let request = request.validate().map_err(|e| {
            warn!(target: "engine", error = %e, "request rejected");
            IntelligenceError::from(e)
        })?;
        if cancel.is_cancelled() {
            return Err(IntelligenceError::Cancelled);
        }

        let results = self.coordinator.run(&request, cancel).await;

        // Partial results after cancellation are discarded.
        if cancel.is_cancelled() {
            warn!(target: "engine", location = %anon_hash(&request.location), "aggregation cancelled");
            return Err(IntelligenceError::Cancelled);
        }

        let intelligence = self.pipeline.analyze(&results);
        info!(
            target: "engine",
            location = %anon_hash(&request.location),
            succeeded = intelligence.succeeded(),
            total = results.len(),
            convergent = intelligence.viral_convergence.len(),
            confidence = intelligence.confidence_score,
            "aggregation complete"
        );

        Ok(EngineRun {
            intelligence,
            results,
        })
    }
}
