//! Prometheus exporter and the request/adapter series recorded by the API.
//!
//! The recorder is process-global; [`Metrics::init`] installs it once and hands
//! out clones of the same handle afterwards.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::engine::EngineRun;

pub const REQUESTS_TOTAL: &str = "intel_requests_total";
pub const REQUEST_ERRORS_TOTAL: &str = "intel_request_errors_total";
pub const ADAPTER_RESULTS_TOTAL: &str = "intel_adapter_results_total";
pub const ADAPTER_LATENCY_MS: &str = "intel_adapter_latency_ms";
pub const CONFIDENCE_SCORE: &str = "intel_confidence_score";

const LATENCY_BUCKETS_MS: &[f64] = &[
    10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
];

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub fn init() -> Result<Self> {
        let handle = HANDLE.get_or_try_init(install)?.clone();
        Ok(Self { handle })
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn install() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(ADAPTER_LATENCY_MS.to_string()), LATENCY_BUCKETS_MS)
        .context("prometheus: latency buckets")?
        .install_recorder()
        .context("prometheus: install recorder")?;

    describe_counter!(REQUESTS_TOTAL, "Aggregation requests received");
    describe_counter!(REQUEST_ERRORS_TOTAL, "Aggregation requests rejected or cancelled");
    describe_counter!(ADAPTER_RESULTS_TOTAL, "Adapter invocations by source and status");
    describe_histogram!(ADAPTER_LATENCY_MS, "Adapter wall time in milliseconds");
    describe_gauge!(CONFIDENCE_SCORE, "Confidence score of the last aggregation");

    // Pre-register so the series show up before the first request.
    counter!(REQUESTS_TOTAL).absolute(0);
    counter!(REQUEST_ERRORS_TOTAL).absolute(0);

    Ok(handle)
}

pub fn record_request() {
    counter!(REQUESTS_TOTAL).increment(1);
}

pub fn record_request_error(reason: &'static str) {
    counter!(REQUEST_ERRORS_TOTAL, "reason" => reason).increment(1);
}

/// Per-adapter outcome and latency, plus the resulting confidence.
pub fn record_run(run: &EngineRun) {
    for r in &run.results {
        let status = if r.is_success() { "success" } else { "failed" };
        counter!(
            ADAPTER_RESULTS_TOTAL,
            "source" => r.source.id.clone(),
            "status" => status
        )
        .increment(1);
        histogram!(ADAPTER_LATENCY_MS, "source" => r.source.id.clone()).record(r.elapsed_ms as f64);
    }
    gauge!(CONFIDENCE_SCORE).set(run.intelligence.confidence_score as f64);
}
