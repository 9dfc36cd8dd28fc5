//! Output shape of one aggregation: the value handed back to callers and
//! serialized as the HTTP response.

use serde::Serialize;

use crate::convergence::{ConvergentTrend, TrendLifecycle};
use crate::error::ErrorKind;
use crate::fanout::{SourceResult, SourceStatus};
use crate::influence::InfluenceEntry;
use crate::narrative::NEUTRAL_CLAUSE;

/// Per-source status line, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub id: String,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl From<&SourceResult> for SourceReport {
    fn from(r: &SourceResult) -> Self {
        Self {
            id: r.source.id.clone(),
            status: r.status(),
            error_kind: r.error_kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedIntelligence {
    /// Weighted sentiment in `[-1, 1]`.
    pub unified_sentiment: f32,
    /// Convergent terms, strongest first (at most the retention limit).
    pub viral_convergence: Vec<String>,
    pub trend_lifecycle: TrendLifecycle,
    /// Source ids, most influential first.
    pub platform_influence_ranking: Vec<String>,
    /// 0..=100
    pub confidence_score: u8,
    pub narrative: String,
    pub convergent_trends: Vec<ConvergentTrend>,
    /// Scores behind `platform_influence_ranking`, same order.
    pub influence_scores: Vec<InfluenceEntry>,
    pub sources: Vec<SourceReport>,
}

impl AggregatedIntelligence {
    /// Aggregate returned when no source produced data.
    pub fn fallback(results: &[SourceResult], confidence_floor: u8) -> Self {
        Self {
            unified_sentiment: 0.0,
            viral_convergence: Vec::new(),
            trend_lifecycle: TrendLifecycle::default(),
            platform_influence_ranking: Vec::new(),
            confidence_score: confidence_floor.min(100),
            narrative: NEUTRAL_CLAUSE.to_string(),
            convergent_trends: Vec::new(),
            influence_scores: Vec::new(),
            sources: results.iter().map(SourceReport::from).collect(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| s.status == SourceStatus::Success)
            .count()
    }

    pub fn is_fallback(&self) -> bool {
        !self.sources.is_empty() && self.succeeded() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Source, SourceFamily};
    use serde_json::json;

    #[test]
    fn fallback_serializes_in_camel_case() {
        let results = vec![
            SourceResult::failed(
                Source::new("weather", SourceFamily::Weather, 0.1),
                ErrorKind::Timeout,
            ),
            SourceResult::failed(
                Source::new("news", SourceFamily::News, 0.1),
                ErrorKind::UpstreamError,
            ),
        ];
        let agg = AggregatedIntelligence::fallback(&results, 10);
        assert!(agg.is_fallback());

        let v = serde_json::to_value(&agg).unwrap();
        assert_eq!(v["unifiedSentiment"], json!(0.0));
        assert_eq!(v["viralConvergence"], json!([]));
        assert_eq!(v["trendLifecycle"]["emerging"], json!([]));
        assert_eq!(v["platformInfluenceRanking"], json!([]));
        assert_eq!(v["influenceScores"], json!([]));
        assert_eq!(v["confidenceScore"], json!(10));
        assert_eq!(v["narrative"], json!(NEUTRAL_CLAUSE));
        assert_eq!(
            v["sources"],
            json!([
                {"id": "weather", "status": "failed", "errorKind": "timeout"},
                {"id": "news", "status": "failed", "errorKind": "upstream_error"}
            ])
        );
    }

    #[test]
    fn success_report_omits_error_kind() {
        use crate::summary::{NewsSummary, SourceSummary};
        let r = SourceResult::success(
            Source::new("news", SourceFamily::News, 0.1),
            SourceSummary::News(NewsSummary::default()),
        );
        let v = serde_json::to_value(SourceReport::from(&r)).unwrap();
        assert_eq!(v, json!({"id": "news", "status": "success"}));
    }
}
